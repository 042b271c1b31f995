//! Fallback-chain resolution.
//!
//! A [`ChainRun`] is a small state machine over the method chain selected
//! for a snapshot's company type:
//!
//! ```text
//! NotStarted -> Attempting(m1) -> Attempting(m2) -> ... -> Succeeded(result)
//!                                                      \-> Exhausted(error)
//! ```
//!
//! Each step runs the method named by the current `Attempting` state. A
//! method error or a non-positive value records a [`Diagnostic`] and moves on
//! to the next method; the first positive value wins. Both terminal states
//! are absorbing.

use crate::classifier::{CompanyType, SectorClassifier};
use crate::config::ValuationConfig;
use crate::error::{MethodError, NotComputableError};
use crate::methods::{BookValueValuator, DcfValuator, EarningsValuator, MultipleValuator, Valuator};
use crate::registry::method_chain;
use crate::result::{Diagnostic, ValuationMethod, ValuationResult};
use fairval_data::FundamentalsSnapshot;
use tracing::{debug, warn};

/// State of a chain run.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolverState {
    /// No method attempted yet
    NotStarted,
    /// The named method is the next to run
    Attempting(ValuationMethod),
    /// A method produced a positive fair value
    Succeeded(ValuationResult),
    /// Every method in the chain failed
    Exhausted(NotComputableError),
}

impl ResolverState {
    /// Whether the run has finished.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Exhausted(_))
    }
}

/// Classifies snapshots and walks their method chain.
#[derive(Debug, Clone, Default)]
pub struct FairValueResolver {
    classifier: SectorClassifier,
    dcf: DcfValuator,
    earnings: EarningsValuator,
    book_value: BookValueValuator,
    multiple: MultipleValuator,
}

impl FairValueResolver {
    /// Create a resolver from a classifier and valuation assumptions.
    pub fn new(classifier: SectorClassifier, config: ValuationConfig) -> Self {
        Self {
            classifier,
            dcf: DcfValuator::new(config.dcf),
            earnings: EarningsValuator::new(config.earnings),
            book_value: BookValueValuator::new(config.book_value),
            multiple: MultipleValuator::new(),
        }
    }

    /// The classifier in use.
    pub const fn classifier(&self) -> &SectorClassifier {
        &self.classifier
    }

    /// The valuator implementing a method.
    pub fn valuator(&self, method: ValuationMethod) -> &dyn Valuator {
        match method {
            ValuationMethod::Dcf => &self.dcf,
            ValuationMethod::Earnings => &self.earnings,
            ValuationMethod::BookValue => &self.book_value,
            ValuationMethod::Multiple => &self.multiple,
        }
    }

    /// Begin a step-by-step run for a snapshot.
    pub fn start<'a>(&'a self, snapshot: &'a FundamentalsSnapshot) -> ChainRun<'a> {
        let company_type = self.classifier.classify(snapshot);
        ChainRun {
            resolver: self,
            snapshot,
            company_type,
            chain: method_chain(company_type),
            position: 0,
            diagnostics: Vec::new(),
            state: ResolverState::NotStarted,
        }
    }

    /// Run the chain to completion.
    ///
    /// # Errors
    ///
    /// Returns [`NotComputableError`] with one diagnostic per attempted
    /// method when no method produces a positive fair value.
    pub fn resolve(
        &self,
        snapshot: &FundamentalsSnapshot,
    ) -> Result<ValuationResult, NotComputableError> {
        self.start(snapshot).finish()
    }
}

/// One in-progress resolution.
#[derive(Debug)]
pub struct ChainRun<'a> {
    resolver: &'a FairValueResolver,
    snapshot: &'a FundamentalsSnapshot,
    company_type: CompanyType,
    chain: &'static [ValuationMethod],
    position: usize,
    diagnostics: Vec<Diagnostic>,
    state: ResolverState,
}

impl ChainRun<'_> {
    /// Current state.
    pub const fn state(&self) -> &ResolverState {
        &self.state
    }

    /// Company type the chain was selected for.
    pub const fn company_type(&self) -> CompanyType {
        self.company_type
    }

    /// Methods this run walks through, in order.
    pub const fn chain(&self) -> &'static [ValuationMethod] {
        self.chain
    }

    /// Failures recorded so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Advance by one transition and return the new state.
    ///
    /// Terminal states do not change.
    pub fn step(&mut self) -> &ResolverState {
        match &self.state {
            ResolverState::NotStarted => self.advance(),
            ResolverState::Attempting(method) => {
                let method = *method;
                self.attempt(method);
            }
            ResolverState::Succeeded(_) | ResolverState::Exhausted(_) => {}
        }
        &self.state
    }

    /// Step until a terminal state is reached.
    ///
    /// # Errors
    ///
    /// Returns the [`NotComputableError`] of the `Exhausted` state.
    pub fn finish(mut self) -> Result<ValuationResult, NotComputableError> {
        loop {
            match self.state {
                ResolverState::Succeeded(result) => return Ok(result),
                ResolverState::Exhausted(err) => return Err(err),
                ResolverState::NotStarted | ResolverState::Attempting(_) => {
                    self.step();
                }
            }
        }
    }

    fn advance(&mut self) {
        self.state = match self.chain.get(self.position) {
            Some(method) => {
                self.position += 1;
                ResolverState::Attempting(*method)
            }
            None => ResolverState::Exhausted(NotComputableError {
                ticker: self.snapshot.ticker.clone(),
                attempts: std::mem::take(&mut self.diagnostics),
            }),
        };
    }

    fn attempt(&mut self, method: ValuationMethod) {
        let ticker = &self.snapshot.ticker;
        debug!(ticker = %ticker, method = %method, company_type = %self.company_type, "Attempting valuation method");

        let outcome = self
            .resolver
            .valuator(method)
            .value(self.snapshot)
            .and_then(|value| {
                if value.is_finite() && value > 0.0 {
                    Ok(value)
                } else {
                    Err(MethodError::incomplete(format!(
                        "fair value {} is not positive",
                        value
                    )))
                }
            });

        match outcome {
            Ok(value) => {
                debug!(ticker = %ticker, method = %method, value, "Valuation succeeded");
                self.state = ResolverState::Succeeded(ValuationResult {
                    ticker: ticker.clone(),
                    fair_value_per_share: value,
                    method_used: method,
                    diagnostics: std::mem::take(&mut self.diagnostics),
                });
            }
            Err(err) => {
                warn!(ticker = %ticker, method = %method, error = %err, "Valuation method failed, falling back");
                self.diagnostics.push(Diagnostic::new(method, err.to_string()));
                self.advance();
            }
        }
    }
}
