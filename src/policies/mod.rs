mod policy;
mod recorder;
mod rng;
mod softmax;
mod state;

pub use policy::{BatchUpdateElement, PolicyStats, PolicyType};
pub use recorder::TracingRecorder;
pub use softmax::Softmax;
pub use state::BanditState;
