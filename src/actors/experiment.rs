use super::state_store::{DeleteState, SaveState, StateStore};

use crate::errors::PolicyError;
use crate::policies::{BanditState, BatchUpdateElement, PolicyStats, Softmax};

use actix::prelude::*;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Owns one engine. The mailbox serializes every operation on it, so a snapshot
/// can never observe a half-applied reward.
pub struct Experiment {
    id: Uuid,
    policy: Softmax,
    state_store: Addr<StateStore>,
    save_every: u64,
    deleted: bool,
}

impl Experiment {
    pub fn new(id: Uuid, policy: Softmax, state_store: Addr<StateStore>, save_every: u64) -> Self {
        Self {
            id,
            policy,
            state_store,
            save_every,
            deleted: false,
        }
    }

    fn save(&self) {
        info!(id = %self.id, "Saving policy state for experiment");
        self.state_store.do_send(SaveState {
            experiment_id: self.id,
            state: self.policy.export_state(),
        });
    }
}

impl Actor for Experiment {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(id = %self.id, arms = %self.policy.arms(), "Starting actor for experiment");
        self.save();
        ctx.run_interval(Duration::from_secs(self.save_every), |experiment, _| {
            experiment.save();
        });
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        // the store may already be gone during system shutdown, Repository::flush runs first
        if !self.deleted {
            self.save();
        }
        info!(id = %self.id, "Stopped actor for experiment");
    }
}

// Messages
#[derive(Message)]
#[rtype(result = "()")]
pub struct Ping;

#[derive(Message)]
#[rtype(result = "usize")]
pub struct SelectArm;

#[derive(Message)]
#[rtype(result = "Result<(), PolicyError>")]
pub struct Reward {
    pub arm_id: usize,
    pub reward: f64,
}

#[derive(Message)]
#[rtype(result = "Result<(), PolicyError>")]
pub struct RewardBatch {
    pub updates: Vec<BatchUpdateElement>,
}

#[derive(Message)]
#[rtype(result = "BanditState")]
pub struct ExportState;

#[derive(Message)]
#[rtype(result = "Result<(), PolicyError>")]
pub struct RestoreState {
    pub state: BanditState,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Reset;

#[derive(Message)]
#[rtype(result = "PolicyStats")]
pub struct GetStats;

/// Queues the current snapshot on the state store before replying.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Flush;

#[derive(Message)]
#[rtype(result = "()")]
pub struct Delete;

// Handlers
impl Handler<Ping> for Experiment {
    type Result = ();

    fn handle(&mut self, _: Ping, _: &mut Self::Context) -> Self::Result {}
}

impl Handler<SelectArm> for Experiment {
    type Result = usize;

    fn handle(&mut self, _: SelectArm, _: &mut Self::Context) -> Self::Result {
        self.policy.select_arm()
    }
}

impl Handler<Reward> for Experiment {
    type Result = Result<(), PolicyError>;

    fn handle(&mut self, msg: Reward, _: &mut Self::Context) -> Self::Result {
        self.policy.reward(msg.arm_id, msg.reward)
    }
}

impl Handler<RewardBatch> for Experiment {
    type Result = Result<(), PolicyError>;

    fn handle(&mut self, msg: RewardBatch, _: &mut Self::Context) -> Self::Result {
        self.policy.reward_batch(&msg.updates)
    }
}

impl Handler<ExportState> for Experiment {
    type Result = MessageResult<ExportState>;

    fn handle(&mut self, _: ExportState, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.policy.export_state())
    }
}

impl Handler<RestoreState> for Experiment {
    type Result = Result<(), PolicyError>;

    fn handle(&mut self, msg: RestoreState, _: &mut Self::Context) -> Self::Result {
        self.policy.restore_state(msg.state)?;
        info!(id = %self.id, arms = %self.policy.arms(), "Restored experiment state");
        self.save();
        Ok(())
    }
}

impl Handler<Reset> for Experiment {
    type Result = ();

    fn handle(&mut self, _: Reset, _: &mut Self::Context) -> Self::Result {
        self.policy.reset()
    }
}

impl Handler<GetStats> for Experiment {
    type Result = MessageResult<GetStats>;

    fn handle(&mut self, _: GetStats, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.policy.stats())
    }
}

impl Handler<Flush> for Experiment {
    type Result = ();

    fn handle(&mut self, _: Flush, _: &mut Self::Context) -> Self::Result {
        self.save()
    }
}

impl Handler<Delete> for Experiment {
    type Result = ();

    fn handle(&mut self, _: Delete, ctx: &mut Self::Context) -> Self::Result {
        info!(id = %self.id, "Deleting experiment");
        self.deleted = true;
        self.state_store.do_send(DeleteState {
            experiment_id: self.id,
        });
        ctx.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::state_store::LoadState;
    use crate::config::StateStoreConfig;

    fn start_experiment() -> (Uuid, Addr<Experiment>, Addr<StateStore>) {
        let state_store = StateStore::new(StateStoreConfig {
            path: std::env::temp_dir().join(format!("experiment-{}.json", Uuid::new_v4())),
            persist_every: 86_400,
        })
        .start();
        let id = Uuid::new_v4();
        let policy = Softmax::new(3, 0.5, 1.0, Some(1234)).unwrap();
        let experiment = Experiment::new(id, policy, state_store.clone(), 86_400).start();

        (id, experiment, state_store)
    }

    #[actix::test]
    async fn select_and_reward() {
        let (_, experiment, _) = start_experiment();

        let arm_id = experiment.send(SelectArm).await.unwrap();
        assert!(arm_id < 3);

        experiment
            .send(Reward { arm_id: 1, reward: 10.0 })
            .await
            .unwrap()
            .unwrap();
        let state = experiment.send(ExportState).await.unwrap();
        assert_eq!(state.counts, vec![0, 1, 0]);
        assert_eq!(state.values, vec![0.0, 5.0, 0.0]);

        let err = experiment
            .send(Reward { arm_id: 3, reward: 1.0 })
            .await
            .unwrap();
        assert!(matches!(err, Err(PolicyError::InvalidArgument(_))));
    }

    #[actix::test]
    async fn restore_saves_to_store() {
        let (id, experiment, state_store) = start_experiment();
        let state = BanditState {
            arms: 2,
            gamma: 1.0,
            tau: 0.5,
            counts: vec![7, 1],
            values: vec![0.2, 0.4],
        };

        experiment
            .send(RestoreState {
                state: state.clone(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(experiment.send(ExportState).await.unwrap(), state);

        // the restore handler queued a SaveState before replying
        let stored = state_store
            .send(LoadState { experiment_id: id })
            .await
            .unwrap();
        assert_eq!(stored, Some(state));
    }

    #[actix::test]
    async fn rejected_restore_keeps_state() {
        let (_, experiment, _) = start_experiment();
        experiment
            .send(RewardBatch {
                updates: vec![(0, 1.0), (2, 4.0)],
            })
            .await
            .unwrap()
            .unwrap();
        let before = experiment.send(ExportState).await.unwrap();

        let result = experiment
            .send(RestoreState {
                state: BanditState {
                    counts: vec![0],
                    ..before.clone()
                },
            })
            .await
            .unwrap();
        assert!(matches!(result, Err(PolicyError::InvalidState(_))));
        assert_eq!(experiment.send(ExportState).await.unwrap(), before);
    }

    #[actix::test]
    async fn reset_and_stats() {
        let (_, experiment, _) = start_experiment();
        experiment
            .send(Reward { arm_id: 0, reward: 2.0 })
            .await
            .unwrap()
            .unwrap();
        experiment.send(Reset).await.unwrap();

        let stats = experiment.send(GetStats).await.unwrap();
        assert_eq!(stats.arms.len(), 3);
        assert!(stats.arms.iter().all(|arm| arm.pulls == 0));
    }
}
