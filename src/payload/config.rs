/// Two bytes of every fragment's header are reserved for the fragment
/// indicator + fragment header (RFC 6184-style FU-A layout, see spec §6).
pub const FRAGMENT_HEADER_LEN: usize = 2;

/// Fixed "this is a fragment" type tag carried in the 5 low bits of the
/// fragment indicator byte, matching RFC 6184's FU-A type 28.
pub const FRAGMENT_UNIT_TYPE: u8 = 28;
