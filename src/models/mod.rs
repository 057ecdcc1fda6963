pub mod message;
pub mod persona;
pub mod price_bar;
pub mod report;
pub mod session;

pub use message::{Message, Role};
pub use persona::{AgentProfile, DisplayStyle, Persona, PersonaConfig};
pub use price_bar::{Period, PriceBar};
pub use report::{EditedReport, ReportPayload};
pub use session::{
    BlogDraft, CreateSession, PersonaSet, Session, SessionConfig, SessionView, UpdateSessionConfig,
    WritingStage,
};
