use crate::models::UserProfile;

/// Check whether two users may be paired.
///
/// Compatibility is symmetric: each side's gender must satisfy the other
/// side's preference. `Any` accepts everything, including an unset gender; a
/// concrete preference is never satisfied by `Unset`.
#[inline]
pub fn mutually_compatible(a: &UserProfile, b: &UserProfile) -> bool {
    a.preferred_gender.accepts(b.gender) && b.preferred_gender.accepts(a.gender)
}
