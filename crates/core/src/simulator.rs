//! Runs the firmware controller against simulated devices.

use crate::bus::{BusWindow, SystemBus};
use crate::metrics::{AccessMetrics, MetricsSummary};
use crate::peripherals::{OutputRegister, SwitchBank, Uart};
use crate::snapshot::{BoardSnapshot, ControllerSnapshot};
use crate::{SimResult, SimulationError};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use switchport_config::{Assertion, ScenarioScript, StopReason};
use switchport_hal::{Controller, InputPort, OutputPort, Phase, Poll};
use tracing::{debug, info, warn};

pub struct Simulator {
    bus: Rc<RefCell<SystemBus>>,
    controller: Controller<BusWindow, BusWindow>,
    uart: switchport_hal::Uart<BusWindow>,
    metrics: Arc<AccessMetrics>,
}

/// How a call to [`Simulator::settle`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// The controller is spinning; `steps` polls were spent getting there.
    Settled { steps: u64 },
    StepLimit,
}

#[derive(Debug, Clone, Serialize)]
pub struct StimulusResult {
    pub index: usize,
    pub switches: u32,
    pub output: u32,
    pub phase: String,
    pub expected: Option<u32>,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub status: String,
    pub stop_reason: StopReason,
    pub steps: u64,
    pub stimulus: Vec<StimulusResult>,
    pub failures: Vec<String>,
    pub faults: Vec<String>,
    pub snapshot: BoardSnapshot,
    pub metrics: MetricsSummary,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.status == "pass"
    }
}

impl Simulator {
    /// Wires the controller and UART helper to the first input port, output
    /// port and UART found on `bus`.
    pub fn new(mut bus: SystemBus) -> SimResult<Self> {
        let input = bus
            .find::<SwitchBank>()
            .map(|(base, _)| base)
            .ok_or(SimulationError::MissingDevice("input port"))?;
        let output = bus
            .find::<OutputRegister>()
            .map(|(base, _)| base)
            .ok_or(SimulationError::MissingDevice("output port"))?;
        let uart = bus
            .find::<Uart>()
            .map(|(base, _)| base)
            .ok_or(SimulationError::MissingDevice("uart"))?;

        let metrics = Arc::new(AccessMetrics::new());
        bus.add_observer(metrics.clone());
        let bus = Rc::new(RefCell::new(bus));

        let controller = Controller::new(
            InputPort::new(BusWindow::new(bus.clone(), input)),
            OutputPort::new(BusWindow::new(bus.clone(), output)),
        );
        let uart = switchport_hal::Uart::new(BusWindow::new(bus.clone(), uart));

        Ok(Self {
            bus,
            controller,
            uart,
            metrics,
        })
    }

    pub fn bus(&self) -> &Rc<RefCell<SystemBus>> {
        &self.bus
    }

    pub fn metrics(&self) -> &AccessMetrics {
        &self.metrics
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    /// One controller step. A bus fault raised during the step is returned
    /// as the error.
    pub fn poll(&mut self) -> SimResult<Poll> {
        let result = self.controller.poll();
        for observer in &self.bus.borrow().observers {
            observer.on_poll(result.is_spinning());
        }
        if let Some(fault) = self.bus.borrow_mut().take_faults().into_iter().next() {
            return Err(fault);
        }
        Ok(result)
    }

    /// Polls until the controller blocks on the hardware, at most
    /// `max_steps` times.
    pub fn settle(&mut self, max_steps: u64) -> SimResult<Settle> {
        let start = self.phase();
        for steps in 1..=max_steps {
            if self.poll()?.is_spinning() {
                if self.phase() != start {
                    debug!("Phase {} -> {}", start.name(), self.phase().name());
                }
                return Ok(Settle::Settled { steps });
            }
        }
        Ok(Settle::StepLimit)
    }

    pub fn set_switches(&mut self, value: u32) -> SimResult<()> {
        let mut bus = self.bus.borrow_mut();
        let (_, bank) = bus
            .find_mut::<SwitchBank>()
            .ok_or(SimulationError::MissingDevice("input port"))?;
        bank.set(value);
        Ok(())
    }

    pub fn output(&self) -> u32 {
        self.bus
            .borrow()
            .find::<OutputRegister>()
            .map(|(_, reg)| reg.value())
            .unwrap_or(0)
    }

    pub fn output_history(&self) -> Vec<u32> {
        self.bus
            .borrow()
            .find::<OutputRegister>()
            .map(|(_, reg)| reg.history().to_vec())
            .unwrap_or_default()
    }

    /// Sends bytes with the firmware's blocking UART helper.
    pub fn uart_send(&mut self, bytes: &[u8]) -> SimResult<()> {
        self.uart.write_bytes(bytes);
        match self.bus.borrow_mut().take_faults().into_iter().next() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    pub fn uart_output(&self) -> Vec<u8> {
        self.bus
            .borrow()
            .find::<Uart>()
            .map(|(_, uart)| uart.output().to_vec())
            .unwrap_or_default()
    }

    pub fn set_uart_echo(&mut self, echo: bool) {
        if let Some((_, uart)) = self.bus.borrow_mut().find_mut::<Uart>() {
            uart.set_echo_stdout(echo);
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let phase = self.phase();
        let last_switches = match phase {
            Phase::Watch { last } => last,
            _ => None,
        };
        let devices = self
            .bus
            .borrow()
            .peripherals
            .iter()
            .map(|p| (p.name.clone(), p.dev.snapshot()))
            .collect();

        BoardSnapshot {
            controller: ControllerSnapshot {
                phase: phase.name().to_string(),
                last_switches,
            },
            devices,
        }
    }

    /// Applies each stimulus in turn, lets the controller settle after each
    /// one and checks the expectations and assertions of `script`.
    pub fn run_script(&mut self, script: &ScenarioScript) -> ScenarioOutcome {
        let mut budget = script.limits.max_steps;
        let mut failures = Vec::new();
        let mut faults = Vec::new();
        let mut results = Vec::new();

        let mut stop_reason = match self.apply(script.initial_switches, &mut budget) {
            Ok(reason) => reason,
            Err(e) => {
                faults.push(e.to_string());
                StopReason::BusFault
            }
        };
        info!(
            "Startup settled in phase {} with output {:#010x}",
            self.phase().name(),
            self.output()
        );

        for (index, stimulus) in script.stimulus.iter().enumerate() {
            if stop_reason != StopReason::Settled {
                failures.push(format!(
                    "stimulus {} not applied: run stopped ({:?})",
                    index, stop_reason
                ));
                break;
            }

            stop_reason = match self.apply(stimulus.switches, &mut budget) {
                Ok(reason) => reason,
                Err(e) => {
                    faults.push(e.to_string());
                    StopReason::BusFault
                }
            };

            if stop_reason == StopReason::Settled {
                if let Some(text) = &stimulus.uart_send {
                    if let Err(e) = self.uart_send(text.as_bytes()) {
                        faults.push(e.to_string());
                        stop_reason = StopReason::BusFault;
                    }
                }
            }

            let output = self.output();
            let passed = stimulus.expect_output.map_or(true, |want| want == output);
            if !passed {
                failures.push(format!(
                    "stimulus {}: switches {:#x} expected output {:#010x}, got {:#010x}",
                    index,
                    stimulus.switches,
                    stimulus.expect_output.unwrap_or_default(),
                    output
                ));
            }
            info!(
                "Stimulus {}: switches {:#x} -> output {:#010x}",
                index, stimulus.switches, output
            );
            results.push(StimulusResult {
                index,
                switches: stimulus.switches,
                output,
                phase: self.phase().name().to_string(),
                expected: stimulus.expect_output,
                passed,
            });
        }

        for assertion in &script.assertions {
            if let Some(failure) = self.check(assertion, stop_reason) {
                failures.push(failure);
            }
        }

        for failure in &failures {
            warn!("{}", failure);
        }

        let status = if failures.is_empty() && faults.is_empty() {
            "pass"
        } else {
            "fail"
        };

        ScenarioOutcome {
            status: status.to_string(),
            stop_reason,
            steps: script.limits.max_steps - budget,
            stimulus: results,
            failures,
            faults,
            snapshot: self.snapshot(),
            metrics: self.metrics.summary(),
        }
    }

    fn apply(&mut self, switches: u32, budget: &mut u64) -> SimResult<StopReason> {
        self.set_switches(switches)?;
        match self.settle(*budget)? {
            Settle::Settled { steps } => {
                *budget -= steps;
                Ok(StopReason::Settled)
            }
            Settle::StepLimit => {
                *budget = 0;
                Ok(StopReason::MaxSteps)
            }
        }
    }

    fn check(&self, assertion: &Assertion, stop_reason: StopReason) -> Option<String> {
        match assertion {
            Assertion::OutputEquals(a) => {
                let output = self.output();
                (output != a.output_equals).then(|| {
                    format!(
                        "output_equals: expected {:#010x}, got {:#010x}",
                        a.output_equals, output
                    )
                })
            }
            Assertion::UartContains(a) => {
                let tx = String::from_utf8_lossy(&self.uart_output()).into_owned();
                (!tx.contains(&a.uart_contains)).then(|| {
                    format!(
                        "uart_contains: {:?} not found in {:?}",
                        a.uart_contains, tx
                    )
                })
            }
            Assertion::ExpectedStopReason(a) => {
                (a.expected_stop_reason != stop_reason).then(|| {
                    format!(
                        "expected_stop_reason: expected {:?}, got {:?}",
                        a.expected_stop_reason, stop_reason
                    )
                })
            }
        }
    }
}
