//! A module to build iCal files

use chrono::{DateTime, Utc};
use ics::properties::{Categories, Created, Description, DtEnd, DtStart, LastModified, RelatedTo, Summary};
use ics::{escape_text, Event, ICalendar};

use crate::task::UserTask;

/// Create an iCal document that contains one `VEVENT` per user task
pub fn build_from(tasks: &[UserTask]) -> String {
    let mut calendar = ICalendar::new("2.0", super::default_prod_id());
    let dtstamp = format_date_time(&Utc::now());

    for task in tasks {
        calendar.add_event(build_event(task, dtstamp.clone()));
    }

    log::debug!("Exported {} tasks to iCal", tasks.len());
    calendar.to_string()
}

fn build_event(task: &UserTask, dtstamp: String) -> Event<'_> {
    let mut event = Event::new(task.id(), dtstamp);
    event.push(Created::new(format_date_time(task.created_at())));
    event.push(LastModified::new(format_date_time(task.updated_at())));
    event.push(DtStart::new(format_date_time(task.start())));
    event.push(DtEnd::new(format_date_time(task.end())));
    event.push(Summary::new(escape_text(task.summary())));
    if task.description().is_empty() == false {
        event.push(Description::new(escape_text(task.description())));
    }
    event.push(Categories::new(escape_text(task.event_type())));
    if let Some(parent) = task.parent_id() {
        event.push(RelatedTo::new(parent));
    }
    event
}

fn format_date_time(dt: &DateTime<Utc>) -> String {
    super::format_ical_date(dt)
}
