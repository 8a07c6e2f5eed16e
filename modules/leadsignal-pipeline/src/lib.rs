pub mod events;
pub mod normalize;
pub mod pipeline;
pub mod scorer;
pub mod session;
pub mod sources;
pub mod store;

pub use events::{ProgressEvent, ProgressKind, SessionStatus};
pub use pipeline::{LeadPipeline, PipelineDeps};
pub use scorer::{IcpScorer, LeadScorer, ScoreModel};
pub use session::{SessionHandle, SessionRegistry, SessionSnapshot};
pub use sources::{ApifyLeadSource, ApifyProfileEnricher, LeadSource, ProfileEnricher};
pub use store::{LeadStore, PgLeadStore};
