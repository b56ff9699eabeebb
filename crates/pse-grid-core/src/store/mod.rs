// ── Shared grid state ──
//
// Lock-free holder of the latest snapshot with push-based change
// notification.

mod grid_store;

pub use grid_store::GridStore;
