pub mod calendar;
pub mod dashboard;
pub mod document;
pub mod media;
pub mod settings;
pub mod system;
pub mod task;
pub mod weather;

pub use calendar::*;
pub use dashboard::*;
pub use document::*;
pub use media::*;
pub use settings::*;
pub use system::*;
pub use task::*;
pub use weather::*;
