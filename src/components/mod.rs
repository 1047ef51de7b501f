pub mod day_view;
pub mod event_form;
pub mod filter_bar;
pub mod month_view;
pub mod status_bar;

pub use day_view::{DayPanel, DayView};
pub use event_form::{EventForm, EventFormState, FormField};
pub use filter_bar::FilterBar;
pub use month_view::{MonthGrid, MonthView};
pub use status_bar::StatusBar;
