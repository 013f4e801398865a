//! Scenario replay against the nullable token ledger.
//!
//! A scenario is a TOML file with an optional `start_secs` (wall-clock time
//! when omitted) and a list of
//! `[[step]]` tables, each tagged by `action`. Steps run in order; a step that
//! fails is recorded and the replay carries on, so a scenario can show a
//! rejection followed by the action that clears it.

use anyhow::Context;
use pledge_nullables::{NullClock, NullTokenLedger};
use pledge_staking::{
    PositionIndex, ProgramId, StakerAccount, StakingEngine, StakingError, StakingEvent,
};
use pledge_types::{Address, Amount, Clock, SystemClock};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::config::CliConfig;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    /// Create tokens for a holder.
    Mint { to: Address, amount: u64 },
    /// Set the allowance a staker grants the pool.
    Approve { staker: Address, amount: u64 },
    Deposit {
        staker: Address,
        program: ProgramId,
        amount: u64,
    },
    /// Move the clock forward.
    Advance {
        #[serde(default)]
        days: u64,
        #[serde(default)]
        secs: u64,
    },
    Withdraw {
        staker: Address,
        index: PositionIndex,
    },
    AdminWithdraw {
        target: Address,
        staker: Address,
        index: PositionIndex,
    },
    /// The owner transfers tokens from its own balance into the pool.
    TopUp { amount: u64 },
    Pause { paused: bool },
    WithdrawAll { target: Address },
    WithdrawSpecified { target: Address, amount: u64 },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Mint { to, amount } => write!(f, "mint {amount} to {to}"),
            Step::Approve { staker, amount } => write!(f, "{staker} approves {amount}"),
            Step::Deposit {
                staker,
                program,
                amount,
            } => write!(f, "{staker} deposits {amount} into program {program}"),
            Step::Advance { days, secs } => write!(f, "advance {days}d {secs}s"),
            Step::Withdraw { staker, index } => write!(f, "{staker} withdraws position {index}"),
            Step::AdminWithdraw {
                target,
                staker,
                index,
            } => write!(f, "owner withdraws {staker}#{index} to {target}"),
            Step::TopUp { amount } => write!(f, "owner tops up pool by {amount}"),
            Step::Pause { paused } => write!(f, "set paused = {paused}"),
            Step::WithdrawAll { target } => write!(f, "owner sweeps pool to {target}"),
            Step::WithdrawSpecified { target, amount } => {
                write!(f, "owner withdraws {amount} from pool to {target}")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Scenario {
    pub start_secs: Option<u64>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).context("failed to parse scenario")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("in {}", path.display()))
    }
}

/// What one step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: usize,
    pub description: String,
    pub result: Result<String, String>,
}

/// Everything a replay produced.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub outcomes: Vec<StepOutcome>,
    pub events: Vec<StakingEvent>,
    pub accounts: Vec<(StakerAccount, Amount)>,
    pub reserve: Amount,
}

impl SimulationReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

type SimEngine = StakingEngine<NullTokenLedger, NullClock>;

/// Configure a fresh engine from `config` and replay `scenario` against it.
pub fn run(config: &CliConfig, scenario: &Scenario) -> Result<SimulationReport, StakingError> {
    let token = NullTokenLedger::new(config.pool.clone());
    let mut engine = StakingEngine::new(
        config.owner.clone(),
        token,
        NullClock::new(
            scenario
                .start_secs
                .unwrap_or_else(|| SystemClock.now().as_secs()),
        ),
    );
    engine.configure(&config.owner, config.catalog()?, config.fine_destination())?;

    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    for (i, step) in scenario.steps.iter().enumerate() {
        let result = apply(&mut engine, &config.owner, step).map_err(|e| e.to_string());
        if let Err(reason) = &result {
            tracing::warn!(index = i, action = %step, %reason, "scenario step failed");
        }
        outcomes.push(StepOutcome {
            step: i,
            description: step.to_string(),
            result,
        });
    }

    let accounts = (0..engine.stakers_addresses_count())
        .filter_map(|i| engine.staker_address(i).cloned())
        .map(|address| {
            let balance = engine.token().balance_of(&address);
            (engine.staker(&address), balance)
        })
        .collect();

    Ok(SimulationReport {
        outcomes,
        reserve: engine.reserve_balance(),
        events: engine.drain_events(),
        accounts,
    })
}

fn raw(amount: u64) -> Amount {
    Amount::new(u128::from(amount))
}

fn apply(engine: &mut SimEngine, owner: &Address, step: &Step) -> Result<String, StakingError> {
    match step {
        Step::Mint { to, amount } => {
            engine.token_mut().mint(to, raw(*amount));
            Ok(format!("{to} balance {}", engine.token().balance_of(to)))
        }
        Step::Approve { staker, amount } => {
            engine.token_mut().approve(staker, raw(*amount));
            Ok(format!("allowance {amount}"))
        }
        Step::Deposit {
            staker,
            program,
            amount,
        } => {
            let index = engine.deposit(staker, *program, raw(*amount))?;
            Ok(format!("position {index}"))
        }
        Step::Advance { days, secs } => {
            engine.clock().advance_days(*days);
            engine.clock().advance(*secs);
            Ok(format!("now {}", engine.clock().now()))
        }
        Step::Withdraw { staker, index } => {
            let payout = engine.withdraw(staker, *index)?;
            Ok(format!("paid {payout}"))
        }
        Step::AdminWithdraw {
            target,
            staker,
            index,
        } => {
            let payout = engine.admin_withdraw(owner, target, staker, *index)?;
            Ok(format!("paid {payout} to {target}"))
        }
        Step::TopUp { amount } => {
            let pool = engine.token().pool().clone();
            engine.token_mut().transfer(owner, &pool, raw(*amount))?;
            Ok(format!("reserve {}", engine.reserve_balance()))
        }
        Step::Pause { paused } => {
            engine.set_paused(owner, *paused)?;
            Ok(format!("paused {paused}"))
        }
        Step::WithdrawAll { target } => {
            let swept = engine.withdraw_all(owner, target)?;
            Ok(format!("swept {swept}"))
        }
        Step::WithdrawSpecified { target, amount } => {
            engine.withdraw_specified(owner, target, raw(*amount))?;
            Ok(format!("reserve {}", engine.reserve_balance()))
        }
    }
}
