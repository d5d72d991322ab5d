//! Mapping from group codes to animation triggers

use std::ops::RangeInclusive;

use rand::Rng;

/// Group codes an action may dispatch
pub const DISPATCH_GROUPS: RangeInclusive<i32> = 1..=14;

/// Trigger names for codes 2 through 17
const TRIGGERS: [&str; 16] = [
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
];

/// Resolve an action's group id to a dispatchable group code
///
/// Returns `None` for codes outside [`DISPATCH_GROUPS`].
#[must_use]
pub fn dispatch_group(group_id: i32) -> Option<i32> {
    DISPATCH_GROUPS.contains(&group_id).then_some(group_id)
}

/// Trigger name for a group code
///
/// Code 1 picks one of two variants, `one_0` or `one_1`, at random.
pub fn animation_trigger<R: Rng + ?Sized>(code: i32, rng: &mut R) -> Option<String> {
    if code == 1 {
        return Some(format!("one_{}", rng.gen_range(0..2)));
    }

    let index = usize::try_from(code.checked_sub(2)?).ok()?;
    TRIGGERS.get(index).map(|t| (*t).to_string())
}
