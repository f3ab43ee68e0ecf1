//! Structured error types for mscan
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Every label-map error is a protocol violation by the trace producer: the
//! replay must stop, there is no retry path.

use super::types::{GuestAddr, LabelKind, ObjectId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelMapError {
    #[error("bad label type {label_type} at {addr}")]
    InvalidLabelType { label_type: u32, addr: GuestAddr },

    #[error("zero-byte {kind} label at {addr}")]
    ZeroSize { kind: LabelKind, addr: GuestAddr },

    #[error("label at {addr} of {bytes} bytes wraps the address space")]
    AddressOverflow { addr: GuestAddr, bytes: u64 },

    #[error("label at {addr} of {bytes} bytes overlaps live {existing} at {existing_addr}")]
    Overlap { addr: GuestAddr, bytes: u64, existing: ObjectId, existing_addr: GuestAddr },

    #[error("unlabel miss for {kind} at {addr} while tracing enabled")]
    MissWhileEnabled { kind: LabelKind, addr: GuestAddr },

    #[error("suspicious number of {kind} unlabel misses ({misses}), last at {addr}")]
    TooManyMisses { kind: LabelKind, addr: GuestAddr, misses: u64 },
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error(transparent)]
    LabelMap(#[from] LabelMapError),

    #[error("CPU {cpu} out of range (max {max})")]
    CpuOutOfRange { cpu: u32, max: usize },

    #[error("Unknown host record type: {0}")]
    UnknownHostType(u32),

    #[error("Replay halted by an earlier fatal error")]
    Halted,

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_map_error_display() {
        let err = LabelMapError::ZeroSize { kind: LabelKind::Heap, addr: GuestAddr(0x2000) };
        assert_eq!(err.to_string(), "zero-byte heap label at 0x2000");
    }

    #[test]
    fn test_overlap_error_names_both_objects() {
        let err = LabelMapError::Overlap {
            addr: GuestAddr(0x1008),
            bytes: 16,
            existing: ObjectId(3),
            existing_addr: GuestAddr(0x1000),
        };
        let msg = err.to_string();
        assert!(msg.contains("0x1008"));
        assert!(msg.contains("Object#3"));
        assert!(msg.contains("0x1000"));
    }

    #[test]
    fn test_replay_error_wraps_label_map_error() {
        let err: ReplayError =
            LabelMapError::MissWhileEnabled { kind: LabelKind::Static, addr: GuestAddr(0x40) }
                .into();
        assert_eq!(err.to_string(), "unlabel miss for static at 0x40 while tracing enabled");
    }

    #[test]
    fn test_replay_error_messages() {
        let cases = [
            (ReplayError::CpuOutOfRange { cpu: 5, max: 4 }, "CPU 5 out of range (max 4)"),
            (ReplayError::UnknownHostType(9), "Unknown host record type: 9"),
            (ReplayError::Halted, "Replay halted by an earlier fatal error"),
        ];
        for (err, expected) in cases {
            // Every variant is either listed above or wraps a lower-level error.
            match &err {
                ReplayError::CpuOutOfRange { .. }
                | ReplayError::UnknownHostType(_)
                | ReplayError::Halted => assert_eq!(err.to_string(), expected),
                ReplayError::LabelMap(_) | ReplayError::Config(_) => unreachable!(),
            }
        }
    }
}
