//! Deterministic room key for a direct-message pair.

/// Canonical room id for the unordered pair `(a, b)`.
///
/// Sort the two ids, join with `_`. Both participants compute the same key
/// regardless of who is sending, so their connections land in the same room.
pub fn direct_room_id(a: &str, b: &str) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}_{hi}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric() {
        assert_eq!(direct_room_id("alice", "bob"), direct_room_id("bob", "alice"));
    }

    #[test]
    fn sorted_join() {
        assert_eq!(direct_room_id("u2", "u1"), "u1_u2");
        assert_eq!(direct_room_id("u1", "u2"), "u1_u2");
    }

    #[test]
    fn self_pair() {
        assert_eq!(direct_room_id("solo", "solo"), "solo_solo");
    }
}
