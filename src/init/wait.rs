use std::error::Error;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::error;

type TaskError = Box<dyn Error + Send + Sync>;

/// Surface the result of the first task in the set to finish.
pub async fn wait_for_any_task(
    tasks: &mut JoinSet<Result<(), TaskError>>,
) -> Result<(), TaskError> {
    match tasks.join_next().await {
        None => Ok(()), // should not happen
        Some(res) => res?,
    }
}

/// Drain the set, bounding the total wait with one shared deadline.
///
/// Join errors are logged, not propagated; an exceeded deadline is.
pub async fn wait_for_tasks_with_timeout(
    tasks: &mut JoinSet<Result<(), TaskError>>,
    max_wait: Duration,
) -> Result<(), TaskError> {
    let stop_at = Instant::now() + max_wait;
    let mut result = Ok(());
    loop {
        match timeout_at(stop_at, tasks.join_next()).await {
            Err(_) => {
                result = Err("timed out waiting for tasks to complete".into());
                break;
            }
            Ok(None) => break,
            Ok(Some(Ok(task_result))) => {
                if let Err(e) = task_result {
                    result = Err(e);
                }
            }
            Ok(Some(Err(e))) => error!("failed to join task: {e}"),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn any_task_surfaces_first_completion() {
        let mut tasks: JoinSet<Result<(), TaskError>> = JoinSet::new();
        tasks.spawn(async { Ok(()) });
        assert!(wait_for_any_task(&mut tasks).await.is_ok());
    }

    #[tokio::test]
    async fn any_task_surfaces_failure() {
        let mut tasks: JoinSet<Result<(), TaskError>> = JoinSet::new();
        tasks.spawn(async { Err("boom".into()) });
        assert!(wait_for_any_task(&mut tasks).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn drain_times_out_on_stuck_task() {
        let mut tasks: JoinSet<Result<(), TaskError>> = JoinSet::new();
        tasks.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });

        let result = wait_for_tasks_with_timeout(&mut tasks, Duration::from_secs(1)).await;
        assert!(result.is_err());
        tasks.abort_all();
    }

    #[tokio::test]
    async fn drain_collects_all_results() {
        let mut tasks: JoinSet<Result<(), TaskError>> = JoinSet::new();
        tasks.spawn(async { Ok(()) });
        tasks.spawn(async { Ok(()) });
        assert!(
            wait_for_tasks_with_timeout(&mut tasks, Duration::from_secs(5))
                .await
                .is_ok()
        );
    }
}
