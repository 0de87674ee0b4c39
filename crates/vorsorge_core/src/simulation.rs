//! Segmented simulation driver
//!
//! Drives an ordered list of phases year by year, threading the
//! `YearState` value through savings and withdrawal steps. Configurations
//! are validated in full before the first step; the loop itself cannot
//! fail. Portfolio exhaustion ends the run early and is reported through
//! the result, with the duration reflecting the years actually simulated.

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::accumulation::savings_year;
use crate::error::Result;
use crate::model::{PhaseKind, SimulationConfig, SimulationResult, WithdrawalState, YearState};
use crate::withdrawal::withdrawal_year;

/// Run one configuration to completion.
///
/// The seed feeds the `Random` return mode; configurations without random
/// draws produce identical records for any seed.
pub fn simulate(config: &SimulationConfig, seed: u64) -> Result<SimulationResult> {
    config.validate()?;
    let phases = config.resolved_phases()?;

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut state = YearState::initial(config.start_year, config.initial_capital);
    let mut records = Vec::with_capacity(config.horizon_years());
    let mut exhausted = false;

    'phases: for phase in &phases {
        match &phase.kind {
            PhaseKind::Savings(savings) => {
                for _ in phase.start_year..=phase.end_year {
                    let (next, record) =
                        savings_year(state, savings, &config.tax, config.granularity, &mut rng);
                    records.push(record);
                    state = next;
                }
            }
            PhaseKind::Withdrawal(withdrawal) => {
                // Strategy sub-state does not carry across segment
                // boundaries; each withdrawal segment starts fresh.
                let phase_start_capital = state.capital;
                state = YearState {
                    withdrawal: WithdrawalState::default(),
                    ..state
                };
                for (year_index, _) in (phase.start_year..=phase.end_year).enumerate() {
                    let (next, record, ran_dry) = withdrawal_year(
                        state,
                        withdrawal,
                        &config.tax,
                        config.granularity,
                        phase_start_capital,
                        year_index,
                        &mut rng,
                    );
                    records.push(record);
                    state = next;
                    if ran_dry {
                        exhausted = true;
                        break 'phases;
                    }
                }
            }
        }
    }

    let duration_years = records.len();
    Ok(SimulationResult {
        records,
        exhausted,
        duration_years,
    })
}
