//! Voice dialogue: command routing and the interaction loop

mod events;
mod router;
mod worker;

pub use events::{DialogueEvent, DialogueStatus, Speaker};
pub use router::{CommandRouter, RouterAction, RouterResponse};
pub use worker::DialogueWorker;
