pub mod coordinator;
pub mod event;
pub mod poller;
pub mod presenter;
pub mod runner;
pub mod state;

pub use coordinator::Coordinator;
pub use event::{Effect, Event, NoticeLevel};
pub use poller::PollHandle;
pub use presenter::Presenter;
pub use runner::TaskRunner;
pub use state::{Task, TaskState};
