//! Unique name generation shared by every "new node" operation.

use std::collections::HashSet;

/// Return `prefix + N` where N is the smallest positive integer such that the
/// result is not in `used`.
///
/// The scan restarts from 1 on every call, so indices freed by deletion are
/// reused. Callers must include the names of pending, not-yet-inserted nodes
/// in `used` to avoid collisions mid-gesture.
pub fn new_name(prefix: &str, used: &HashSet<String>) -> String {
    let mut index = 1u32;
    loop {
        let candidate = format!("{}{}", prefix, index);
        if !used.contains(&candidate) {
            return candidate;
        }
        index += 1;
    }
}
