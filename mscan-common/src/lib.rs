//! # Shared Trace Record Shapes (Trace Producer ↔ Analysis)
//!
//! Defines the raw record layouts emitted by the instrumented guest (an
//! mtrace-enabled VM or kernel) after the trace reader has split the stream
//! into fixed-size entries. All types use `#[repr(C)]` so the reader can hand
//! entries over without reshaping them.
//!
//! Decoding the byte stream is the reader's job; this crate only pins down the
//! shapes and constants both sides agree on.
//!
//! ## Key Types
//!
//! - [`LabelEntry`] - An object was allocated (labelled) at a guest address
//! - [`UnlabelEntry`] - A previously labelled object was freed
//! - [`HostEntry`] - Host-side control record (tracing enable/disable)
//! - [`FcallEntry`] - Current call/kernel entry point and task on a CPU
//! - [`MachineEntry`] - Description of the traced guest machine

#![cfg_attr(not(test), no_std)]

// ============================================================================
// Label Types
// ============================================================================

/// Reserved, never valid on the wire
pub const LABEL_NONE: u32 = 0;

/// Dynamically allocated heap object (kmalloc, kmem_cache, ...)
pub const LABEL_HEAP: u32 = 1;

/// Page-allocator block
///
/// Blocks are accepted on the wire but excluded from object-level tracking.
pub const LABEL_BLOCK: u32 = 2;

/// Statically allocated object (kernel .data/.bss)
pub const LABEL_STATIC: u32 = 3;

/// Per-CPU variable area
pub const LABEL_PERCPU: u32 = 4;

/// One past the last valid label type
pub const LABEL_END: u32 = 5;

// ============================================================================
// Host Record Types
// ============================================================================

/// Host record toggling full access tracing
///
/// `HostEntry::value != 0` means tracing is enabled from this point on.
pub const HOST_ACCESS: u32 = 1;

/// Host record reporting the workload's completed operation count
pub const HOST_APP_OPS: u32 = 2;

// ============================================================================
// Limits
// ============================================================================

/// Maximum number of guest CPUs a trace may reference
pub const MAX_CPUS: usize = 4;

/// Size of the NUL-padded name carried by a label record
pub const LABEL_STR_LEN: usize = 32;

/// Cache line size of the traced machine, in bytes
pub const CACHE_LINE_SIZE: u64 = 64;

// ============================================================================
// Shared Data Structures
// ============================================================================

/// Allocation of a tracked object
///
/// **Memory Layout**: `#[repr(C)]`, 64 bytes
#[repr(C)]
#[derive(Clone, Copy)]
pub struct LabelEntry {
    /// Label kind (see `LABEL_*` constants)
    ///
    /// `LABEL_NONE` and anything `>= LABEL_END` are protocol violations.
    pub label_type: u32,

    /// Padding for 8-byte alignment
    #[allow(clippy::pub_underscore_fields)]
    pub _padding: [u8; 4],

    /// First byte of the object in the guest address space
    pub guest_addr: u64,

    /// Object size in bytes, must be non-zero
    pub bytes: u64,

    /// Program counter of the allocation call site (0 if unknown)
    pub pc: u64,

    /// Optional object name, NUL-padded
    ///
    /// Example: "kmalloc-64", "inode_cache"
    pub str: [u8; LABEL_STR_LEN],
}

impl LabelEntry {
    /// Build an entry, truncating `name` to fit the fixed-size field
    #[must_use]
    pub fn new(label_type: u32, guest_addr: u64, bytes: u64, pc: u64, name: &[u8]) -> Self {
        let mut str = [0u8; LABEL_STR_LEN];
        let len = name.len().min(LABEL_STR_LEN);
        str[..len].copy_from_slice(&name[..len]);
        Self { label_type, _padding: [0; 4], guest_addr, bytes, pc, str }
    }

    /// The name bytes, up to (not including) the first NUL
    #[must_use]
    pub fn name(&self) -> &[u8] {
        label_str(&self.str)
    }
}

/// Deallocation of a tracked object
///
/// Matched against live objects by exact start address.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct UnlabelEntry {
    /// Label kind of the object being freed
    pub label_type: u32,

    /// Padding for 8-byte alignment
    #[allow(clippy::pub_underscore_fields)]
    pub _padding: [u8; 4],

    /// Start address the object was labelled at
    pub guest_addr: u64,
}

impl UnlabelEntry {
    #[must_use]
    pub fn new(label_type: u32, guest_addr: u64) -> Self {
        Self { label_type, _padding: [0; 4], guest_addr }
    }
}

/// Host-side control record
#[repr(C)]
#[derive(Clone, Copy)]
pub struct HostEntry {
    /// Host record type (see `HOST_*` constants)
    pub host_type: u32,

    /// Padding for 8-byte alignment
    #[allow(clippy::pub_underscore_fields)]
    pub _padding: [u8; 4],

    /// Type-specific payload
    ///
    /// For `HOST_ACCESS`: non-zero when full tracing is enabled.
    pub value: u64,
}

impl HostEntry {
    #[must_use]
    pub fn new(host_type: u32, value: u64) -> Self {
        Self { host_type, _padding: [0; 4], value }
    }
}

/// Function call / kernel entry point on one CPU
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FcallEntry {
    /// Guest CPU index (0-based, `< MAX_CPUS`)
    pub cpu: u32,

    /// Call depth at the time of the record
    pub depth: u32,

    /// Guest task (thread) identifier
    pub tid: u64,

    /// Program counter of the entry point
    pub pc: u64,
}

/// Description of the traced guest machine, emitted once at trace start
#[repr(C)]
#[derive(Clone, Copy)]
pub struct MachineEntry {
    /// Number of guest CPUs
    pub num_cpus: u32,

    /// Padding for 8-byte alignment
    #[allow(clippy::pub_underscore_fields)]
    pub _padding: [u8; 4],

    /// Guest RAM size in bytes
    pub num_ram: u64,
}

/// Bytes of a NUL-padded fixed-size string, up to the first NUL
#[must_use]
pub fn label_str(raw: &[u8]) -> &[u8] {
    match raw.iter().position(|&b| b == 0) {
        Some(end) => &raw[..end],
        None => raw,
    }
}
