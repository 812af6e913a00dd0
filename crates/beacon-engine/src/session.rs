//! # Scan Session
//!
//! Wires one acquisition channel to the resolver: the per-cycle spine of
//! the scanning surface.
//!
//! ## One Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  source.next_code()                                                     │
//! │   ├── Pending            → CycleOutcome::Pending (camera warming up)   │
//! │   ├── Code(acquired)     → build ScanEvent → resolve → Resolved        │
//! │   ├── Malformed burst    → Resolved(Malformed), store never queried    │
//! │   └── channel failure    → Err (surface downgrades to manual entry)    │
//! │                                                                         │
//! │  The ScanEvent lives for this cycle only; nothing is cached across     │
//! │  cycles, so a stock change between two scans is always visible.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use beacon_core::types::ScanEvent;
use beacon_scan::capture::{CodeSource, NextCode};
use beacon_scan::error::CaptureError;

use crate::error::EngineResult;
use crate::resolver::{ScanOutcome, ScanResolver};

/// Outcome of one scan cycle.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Nothing acquired yet; poll again.
    Pending,
    /// A resolution outcome. `event` is `None` exactly when normalization
    /// rejected the raw burst — there is no code to record.
    Resolved {
        event: Option<ScanEvent>,
        outcome: ScanOutcome,
    },
}

/// A scanning session over one acquisition channel.
pub struct ScanSession<S: CodeSource> {
    source: S,
    resolver: ScanResolver,
}

impl<S: CodeSource> ScanSession<S> {
    pub fn new(source: S, resolver: ScanResolver) -> Self {
        ScanSession { source, resolver }
    }

    /// Runs one cycle: at most one acquired code in, exactly one outcome
    /// out.
    pub async fn cycle(&mut self) -> EngineResult<CycleOutcome> {
        match self.source.next_code() {
            Ok(NextCode::Pending) => Ok(CycleOutcome::Pending),

            Ok(NextCode::Code(acquired)) => {
                let event = ScanEvent {
                    channel: acquired.channel,
                    method: acquired.method,
                    raw: acquired.raw,
                    code: acquired.code,
                    at: acquired.acquired_at,
                };
                let outcome = self.resolver.resolve(&event.code).await?;
                Ok(CycleOutcome::Resolved {
                    event: Some(event),
                    outcome,
                })
            }

            // A burst the normalizer rejected is a Malformed outcome, not
            // a channel failure; the store is never queried for it.
            Err(CaptureError::Malformed { raw, reason }) => Ok(CycleOutcome::Resolved {
                event: None,
                outcome: ScanOutcome::Malformed { raw, reason },
            }),

            Err(other) => Err(other.into()),
        }
    }

    /// Hands the channel back (e.g. to stop a camera).
    pub fn into_source(self) -> S {
        self.source
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use beacon_core::types::{DecodeMethod, SourceChannel};
    use beacon_db::{Database, DbConfig};
    use beacon_scan::capture::WedgeBuffer;

    async fn session_with_wedge(wedge: WedgeBuffer) -> ScanSession<WedgeBuffer> {
        let db = Database::connect(DbConfig::in_memory()).await.unwrap();
        ScanSession::new(wedge, ScanResolver::new(db))
    }

    #[tokio::test]
    async fn test_pending_when_no_burst() {
        let mut session = session_with_wedge(WedgeBuffer::scanner()).await;
        assert!(matches!(session.cycle().await.unwrap(), CycleOutcome::Pending));
    }

    #[tokio::test]
    async fn test_unknown_code_cycle() {
        let mut wedge = WedgeBuffer::scanner();
        wedge.push_str("000123456789\r\n");
        let mut session = session_with_wedge(wedge).await;

        match session.cycle().await.unwrap() {
            CycleOutcome::Resolved {
                event: Some(event),
                outcome: ScanOutcome::Unknown(code),
            } => {
                assert_eq!(code.as_str(), "000123456789");
                assert_eq!(event.channel, SourceChannel::Scanner);
                assert_eq!(event.method, DecodeMethod::Manual);
                assert_eq!(event.raw, "000123456789");
            }
            other => panic!("expected unknown resolution, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_cycle_has_no_event() {
        let mut wedge = WedgeBuffer::manual();
        wedge.push_str("???\n");
        let mut session = session_with_wedge(wedge).await;

        match session.cycle().await.unwrap() {
            CycleOutcome::Resolved {
                event: None,
                outcome: ScanOutcome::Malformed { raw, .. },
            } => assert_eq!(raw, "???"),
            other => panic!("expected malformed resolution, got {:?}", other),
        }
    }
}
