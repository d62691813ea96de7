//! Episode loops for random and scripted runs.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use cda_core::{ActionOutcome, CdaEnv, EnvConfig, StepResult, TraderId};
use cda_protocol::{format_agg_book, format_step_report, ScriptStep};

use crate::agents::{Agent, MarketView, RandomAgent};
use crate::config::SimConfig;

/// End-of-episode totals.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub episode: u32,
    pub seed: u64,
    pub steps: u32,
    pub trades: usize,
    pub rejections: usize,
    pub final_navs: BTreeMap<TraderId, f64>,
    pub total_sys_profit: f64,
}

impl EpisodeSummary {
    pub fn to_line(&self) -> String {
        let navs: Vec<String> = self
            .final_navs
            .iter()
            .map(|(id, nav)| format!("{}:{:.4}", id, nav))
            .collect();
        format!(
            "episode {} seed {} steps {} trades {} rejections {} profit {:.4} navs [{}]",
            self.episode,
            self.seed,
            self.steps,
            self.trades,
            self.rejections,
            self.total_sys_profit,
            navs.join(" ")
        )
    }
}

/// Accumulates per-step counts for one episode.
#[derive(Debug, Default)]
struct Tally {
    steps: u32,
    trades: usize,
    rejections: usize,
}

impl Tally {
    fn record(&mut self, result: &StepResult) {
        self.steps += 1;
        self.trades += result.trades().len();
        self.rejections += result
            .infos
            .values()
            .flat_map(|info| info.outcomes.iter())
            .filter(|o| matches!(o, ActionOutcome::Rejected(_)))
            .count();
    }

    fn finish(self, episode: u32, seed: u64, env: &CdaEnv) -> EpisodeSummary {
        EpisodeSummary {
            episode,
            seed,
            steps: self.steps,
            trades: self.trades,
            rejections: self.rejections,
            final_navs: env
                .accounts()
                .iter()
                .map(|a| (a.trader_id(), a.nav()))
                .collect(),
            total_sys_profit: env.total_system_profit(),
        }
    }
}

/// Run `config.episodes` episodes with one [`RandomAgent`] per trader.
///
/// With `render`, the environment dump is written to `out` after every step;
/// the summary line of each episode is always written.
pub fn run_random<W: Write>(config: &SimConfig, render: bool, out: &mut W) -> Result<Vec<EpisodeSummary>> {
    let mut env = CdaEnv::new(config.env.clone()).context("building environment")?;
    let tick = env.book().tick_size();
    let mut summaries = Vec::with_capacity(config.episodes as usize);

    for episode in 0..config.episodes {
        let seed = config.env.seed.wrapping_add(episode as u64);
        let mut agents: Vec<RandomAgent> = (0..config.env.num_traders)
            .map(|id| {
                let agent_seed = seed.wrapping_mul(1_000_003).wrapping_add(id as u64);
                RandomAgent::new(id, config.agents.clone(), agent_seed)
            })
            .collect();

        let mut observations = env.reset_with_seed(seed);
        let mut dones: BTreeMap<TraderId, bool> = BTreeMap::new();
        let mut tally = Tally::default();

        loop {
            let mark_price = env.book().mark_price();
            let actions: Vec<_> = agents
                .iter_mut()
                .filter(|agent| !dones.get(&agent.trader_id()).copied().unwrap_or(false))
                .filter_map(|agent| {
                    let observation = observations.get(&agent.trader_id())?;
                    let view = MarketView {
                        observation,
                        mark_price,
                        tick_size: tick,
                    };
                    Some(agent.act(&view))
                })
                .collect();

            let result = env.step(&actions)?;
            tally.record(&result);
            if render {
                writeln!(out, "{}", env.render())?;
            }

            if result.all_done {
                break;
            }
            observations = result.observations;
            dones = result.dones;
        }

        let summary = tally.finish(episode, seed, &env);
        info!(
            episode,
            steps = summary.steps,
            trades = summary.trades,
            profit = summary.total_sys_profit,
            "episode summary"
        );
        writeln!(out, "{}", summary.to_line())?;
        summaries.push(summary);
    }

    Ok(summaries)
}

/// Replay a parsed action script as one episode, writing CSV report lines
/// (`T`, `O`, `R`, then `L` for the book left after the step) to `out`.
///
/// The run stops early if every trader is done before the script ends.
pub fn run_script<W: Write>(
    env_config: &EnvConfig,
    steps: &[ScriptStep],
    render: bool,
    out: &mut W,
) -> Result<EpisodeSummary> {
    let mut env = CdaEnv::new(env_config.clone()).context("building environment")?;
    let tick = env.book().tick_size();
    env.reset();

    let mut tally = Tally::default();
    for (t, step) in steps.iter().enumerate() {
        for &(trader_id, order_id) in &step.cancels {
            match env.cancel(trader_id, order_id) {
                Ok(order) => debug!(trader_id, order_id, remaining = order.remaining_size, "scripted cancel"),
                Err(err) => warn!(t, trader_id, order_id, %err, "scripted cancel failed"),
            }
        }

        let result = env.step(&step.actions)?;
        tally.record(&result);
        for line in format_step_report(&result, tick) {
            writeln!(out, "{}", line)?;
        }
        if let Some(episode) = env.episode() {
            for line in format_agg_book(&episode.agg_lob_aft, tick) {
                writeln!(out, "{}", line)?;
            }
        }
        if render {
            writeln!(out, "{}", env.render())?;
        }

        if result.all_done {
            if t + 1 < steps.len() {
                warn!(t, remaining = steps.len() - t - 1, "episode ended before script");
            }
            break;
        }
    }

    Ok(tally.finish(0, env_config.seed, &env))
}
