use serde_json::json;

use crate::backend::Backend;
use crate::commands::finish;
use crate::controller::Controller;

pub struct EventArgs {
    pub summary: String,
    pub description: String,
    /// Local `YYYY-MM-DDTHH:MM`. Defaults to now.
    pub start: Option<String>,
    /// Local `YYYY-MM-DDTHH:MM`. Defaults to now + 1h.
    pub end: Option<String>,
}

pub async fn run<B: Backend>(controller: &Controller<B>, args: EventArgs) -> i32 {
    controller.open_calendar();
    let mut form = controller.calendar_form();
    form.summary = args.summary;
    form.description = args.description;
    if let Some(start) = args.start {
        form.start = start;
    }
    if let Some(end) = args.end {
        form.end = end;
    }
    controller.set_calendar_form(form);

    let outcome = controller.submit_event().await;
    finish(outcome, "summary, start and end are required", |confirmation| {
        json!({
            "status": "created",
            "message": confirmation.text
        })
    })
}
