use std::{fmt::Debug, hash::Hash};
use trait_set::trait_set;

use crate::generator::Progress;

trait_set!
{
    /// Trait for any type that can identify a [word](crate::word::Word) handed to the engine (database keys, uuids, plain strings...).
    pub trait WordKey = Eq + PartialEq + Ord + PartialOrd + Hash + Clone + Debug + Send + Sync;

    /// Callback that receives [progress](Progress) notifications from a running generation.
    pub trait ProgressFn = Fn(Progress) + Send + Sync;
}
