//! 批量生成状态机
//!
//! 纯函数：给定当前阶段和执行结果，更新计数和日志并返回下一阶段。
//! 不做任何 I/O，执行由 `batch_processor` 负责。
//!
//! ```text
//! Check ──存在──────────────────────────────► 下一章 / Completed
//!   │ 不存在或读取失败
//!   ▼
//! Generate ──成功──► Pause ──► 下一章 / Completed
//!   │  ▲  └──不可重试 / 重试耗尽──► 下一章 / Completed
//!   │  │
//!   ▼  │
//! Backoff（等待 base * 2^(n-1)）
//!
//! 任意非终止阶段 ──取消──► Cancelled
//! ```

use std::time::Duration;

use crate::models::BatchRun;

/// 重试与节流策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 第一次重试前的等待时间
    pub base_delay: Duration,
    /// 每章最多尝试次数（含第一次）
    pub max_attempts: u32,
    /// 两章之间的等待时间
    pub inter_chapter_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_attempts: 5,
            inter_chapter_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// 第 `attempt` 次尝试失败后的等待时间：`base * 2^(attempt-1)`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// 执行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 查询持久存储是否已有该章
    Check { chapter: u32 },
    /// 第 `attempt` 次生成
    Generate { chapter: u32, attempt: u32 },
    /// 第 `attempt` 次生成被限流，等待后重试
    Backoff { chapter: u32, attempt: u32 },
    /// 生成成功后的章间等待
    Pause { chapter: u32 },
    Completed,
    Cancelled,
}

impl Phase {
    /// 起始阶段
    pub fn start(total: u32) -> Self {
        if total == 0 {
            Phase::Completed
        } else {
            Phase::Check { chapter: 1 }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Cancelled)
    }
}

/// 持久存储查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
    /// 读取失败，存在性未知
    Unknown(String),
}

/// 执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Checked(Presence),
    Generated,
    /// 生成成功但持久存储写入失败
    PersistFailed(String),
    GenerationFailed { transient: bool, message: String },
    /// 等待结束
    Waited,
    /// 检测到取消
    CancelObserved,
}

/// 状态转移
pub fn transition(run: &mut BatchRun, phase: Phase, event: Event, policy: &RetryPolicy) -> Phase {
    if phase.is_terminal() {
        return phase;
    }

    if event == Event::CancelObserved {
        run.cancelled = true;
        run.finished = true;
        run.push_log("Interrompido pelo usuário");
        return Phase::Cancelled;
    }

    match (phase, event) {
        (Phase::Check { chapter }, Event::Checked(presence)) => {
            run.current = chapter;
            match presence {
                Presence::Present => {
                    run.skipped += 1;
                    run.push_log(format!("Capítulo {}: já existe, pulando", chapter));
                    advance(run, chapter)
                }
                Presence::Absent => {
                    run.push_log(format!("Capítulo {}: gerando...", chapter));
                    Phase::Generate { chapter, attempt: 1 }
                }
                Presence::Unknown(message) => {
                    run.push_log(format!(
                        "Capítulo {}: falha ao consultar o armazenamento ({}); gerando...",
                        chapter, message
                    ));
                    Phase::Generate { chapter, attempt: 1 }
                }
            }
        }

        (Phase::Generate { chapter, .. }, Event::Generated) => {
            run.generated += 1;
            run.push_log(format!("Capítulo {}: gerado com sucesso", chapter));
            pause_or_finish(run, chapter)
        }

        (Phase::Generate { chapter, .. }, Event::PersistFailed(message)) => {
            run.errors += 1;
            run.push_log(format!(
                "Capítulo {}: gerado, mas não foi salvo: {}",
                chapter, message
            ));
            pause_or_finish(run, chapter)
        }

        (Phase::Generate { chapter, attempt }, Event::GenerationFailed { transient, message }) => {
            if !transient {
                run.errors += 1;
                run.push_log(format!("Capítulo {}: erro: {}", chapter, message));
                return advance(run, chapter);
            }

            if attempt >= policy.max_attempts {
                run.errors += 1;
                run.push_log(format!(
                    "Capítulo {}: falhou após {} tentativas: {}",
                    chapter, attempt, message
                ));
                return advance(run, chapter);
            }

            let wait = policy.backoff_delay(attempt);
            run.push_log(format!(
                "Capítulo {}: limite de requisições (tentativa {}/{}), aguardando {}s",
                chapter,
                attempt,
                policy.max_attempts,
                wait.as_secs_f64()
            ));
            Phase::Backoff { chapter, attempt }
        }

        (Phase::Backoff { chapter, attempt }, Event::Waited) => Phase::Generate {
            chapter,
            attempt: attempt + 1,
        },

        (Phase::Pause { chapter }, Event::Waited) => advance(run, chapter),

        // 其余组合不会由执行器产生
        (phase, _) => phase,
    }
}

/// 进入下一章，或在最后一章后结束
fn advance(run: &mut BatchRun, chapter: u32) -> Phase {
    if chapter >= run.total {
        run.finished = true;
        run.push_log(format!(
            "Concluído: {} gerados, {} já existentes, {} erros",
            run.generated, run.skipped, run.errors
        ));
        Phase::Completed
    } else {
        Phase::Check {
            chapter: chapter + 1,
        }
    }
}

/// 最后一章之后不再等待
fn pause_or_finish(run: &mut BatchRun, chapter: u32) -> Phase {
    if chapter >= run.total {
        advance(run, chapter)
    } else {
        Phase::Pause { chapter }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::default()
    }

    fn transient(message: &str) -> Event {
        Event::GenerationFailed {
            transient: true,
            message: message.to_string(),
        }
    }

    /// 依次喂入事件，返回最终阶段，并在每一步检查计数不变量
    fn drive(run: &mut BatchRun, events: Vec<Event>) -> Phase {
        let mut phase = Phase::start(run.total);
        for event in events {
            phase = transition(run, phase, event, &policy());
            assert!(run.counters_consistent(), "{:?}", run);
        }
        phase
    }

    #[test]
    fn backoff_doubles_from_base() {
        let policy = policy();
        let waits: Vec<u64> = (1..policy.max_attempts)
            .map(|n| policy.backoff_delay(n).as_secs())
            .collect();
        assert_eq!(waits, vec![2, 4, 8, 16]);
    }

    #[test]
    fn exhausted_retries_wait_one_less_than_attempts() {
        let policy = policy();
        let mut run = BatchRun::new("pt", "obadiah", 1);
        let mut phase = Phase::Generate { chapter: 1, attempt: 1 };
        let mut backoffs = Vec::new();

        while !phase.is_terminal() {
            phase = match phase {
                Phase::Generate { .. } => transition(&mut run, phase, transient("429"), &policy),
                Phase::Backoff { attempt, .. } => {
                    backoffs.push(policy.backoff_delay(attempt).as_secs());
                    transition(&mut run, phase, Event::Waited, &policy)
                }
                other => panic!("unexpected phase {:?}", other),
            };
        }

        assert_eq!(backoffs, vec![2, 4, 8, 16]);
        assert!(!run.log.iter().any(|line| line.contains("aguardando 32s")));
        assert!(run.log.last().is_some_and(|line| line.contains("Concluído")));
        assert_eq!(run.errors, 1);
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let policy = RetryPolicy {
            base_delay: Duration::from_secs(u64::MAX / 2),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_delay(40), Duration::MAX);
    }

    #[test]
    fn scenario_skip_retry_then_fatal() {
        let mut run = BatchRun::new("pt", "ruth", 3);
        let phase = drive(
            &mut run,
            vec![
                Event::Checked(Presence::Present),
                Event::Checked(Presence::Absent),
                transient("429"),
                Event::Waited,
                transient("429"),
                Event::Waited,
                Event::Generated,
                Event::Waited,
                Event::Checked(Presence::Absent),
                Event::GenerationFailed {
                    transient: false,
                    message: "401".into(),
                },
            ],
        );

        assert_eq!(phase, Phase::Completed);
        assert_eq!(
            (run.skipped, run.generated, run.errors, run.current),
            (1, 1, 1, 3)
        );
        assert!(run.finished);
        assert!(!run.cancelled);
    }

    #[test]
    fn retries_are_capped_at_max_attempts() {
        let mut run = BatchRun::new("pt", "obadiah", 1);
        let mut events = vec![Event::Checked(Presence::Absent)];
        for _ in 0..4 {
            events.push(transient("quota"));
            events.push(Event::Waited);
        }
        events.push(transient("quota"));

        let phase = drive(&mut run, events);
        assert_eq!(phase, Phase::Completed);
        assert_eq!(run.errors, 1);
        assert!(run.log.iter().any(|l| l.contains("falhou após 5 tentativas")));
    }

    #[test]
    fn each_retry_logs_wait_and_attempt() {
        let mut run = BatchRun::new("pt", "obadiah", 1);
        let phase = drive(
            &mut run,
            vec![Event::Checked(Presence::Absent), transient("429")],
        );
        assert_eq!(phase, Phase::Backoff { chapter: 1, attempt: 1 });
        let last = run.log.last().unwrap();
        assert!(last.contains("tentativa 1/5"));
        assert!(last.contains("aguardando 2s"));
    }

    #[test]
    fn cancellation_keeps_current() {
        let mut run = BatchRun::new("pt", "ruth", 4);
        let phase = drive(
            &mut run,
            vec![
                Event::Checked(Presence::Present),
                Event::Checked(Presence::Absent),
                Event::Generated,
                Event::CancelObserved,
            ],
        );
        assert_eq!(phase, Phase::Cancelled);
        assert_eq!(run.current, 2);
        assert!(run.cancelled);
        assert!(run.finished);
        assert!(run.log.last().unwrap().contains("Interrompido pelo usuário"));

        // 终止后不再变化
        let before = run.clone();
        let after = transition(&mut run, phase, Event::Checked(Presence::Absent), &policy());
        assert_eq!(after, Phase::Cancelled);
        assert_eq!(run, before);
    }

    #[test]
    fn store_read_failure_degrades_to_generation() {
        let mut run = BatchRun::new("pt", "ruth", 4);
        let phase = drive(
            &mut run,
            vec![Event::Checked(Presence::Unknown("timeout".into()))],
        );
        assert_eq!(phase, Phase::Generate { chapter: 1, attempt: 1 });
        assert!(run.log[0].contains("falha ao consultar o armazenamento"));
    }

    #[test]
    fn persist_failure_counts_as_error() {
        let mut run = BatchRun::new("pt", "ruth", 4);
        let phase = drive(
            &mut run,
            vec![
                Event::Checked(Presence::Absent),
                Event::PersistFailed("disk full".into()),
            ],
        );
        assert_eq!(phase, Phase::Pause { chapter: 1 });
        assert_eq!((run.generated, run.errors), (0, 1));
    }

    #[test]
    fn last_chapter_skips_pause() {
        let mut run = BatchRun::new("pt", "obadiah", 1);
        let phase = drive(
            &mut run,
            vec![Event::Checked(Presence::Absent), Event::Generated],
        );
        assert_eq!(phase, Phase::Completed);
        assert!(run.log.last().unwrap().contains("Concluído: 1 gerados"));
    }
}
