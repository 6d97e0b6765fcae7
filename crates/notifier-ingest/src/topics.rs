//! Upstream ingest topics, fixed by the observer contract.

/// A new block with its events.
pub const SAVE_BLOCK: &str = "SaveBlock";

/// A previously announced block is no longer canonical.
pub const REVERT_INDEXED_BLOCK: &str = "RevertIndexedBlock";

/// A block reached irreversible commitment.
pub const FINALIZED_BLOCK: &str = "FinalizedBlock";

/// Accepted for protocol completeness, content discarded.
pub const SAVE_ROUNDS_INFO: &str = "SaveRoundsInfo";

/// Accepted for protocol completeness, content discarded.
pub const SAVE_VALIDATORS_RATING: &str = "SaveValidatorsRating";

/// Accepted for protocol completeness, content discarded.
pub const SAVE_VALIDATORS_PUB_KEYS: &str = "SaveValidatorsPubKeys";

/// Accepted for protocol completeness, content discarded.
pub const SAVE_ACCOUNTS: &str = "SaveAccounts";
