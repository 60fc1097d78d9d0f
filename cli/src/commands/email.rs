use serde_json::json;

use asistente_core::payload::EmailForm;

use crate::backend::Backend;
use crate::commands::finish;
use crate::controller::Controller;

pub async fn run<B: Backend>(controller: &Controller<B>, form: EmailForm) -> i32 {
    controller.open_email();
    controller.set_email_form(form);
    let outcome = controller.submit_email().await;
    finish(outcome, "to, subject and body are all required", |confirmation| {
        json!({
            "status": "sent",
            "message": confirmation.text
        })
    })
}
