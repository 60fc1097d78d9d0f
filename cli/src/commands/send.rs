use serde_json::json;

use crate::backend::Backend;
use crate::commands::finish;
use crate::controller::Controller;

pub async fn run<B: Backend>(controller: &Controller<B>, text: &str) -> i32 {
    let outcome = controller.send_message(text).await;
    let session_id = controller.session_id();
    finish(outcome, "input is empty", |reply| {
        json!({
            "session_id": session_id,
            "output": reply.text
        })
    })
}
