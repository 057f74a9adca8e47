/// Default limit on container nesting. Recursion depth tracks input nesting,
/// so unbounded depth is a stack-exhaustion vector on adversarial input.
pub const MAX_DEPTH: usize = 256;

pub(crate) const INTEGER_BEGIN: u8 = b'i';
pub(crate) const LIST_BEGIN: u8 = b'l';
pub(crate) const DICT_BEGIN: u8 = b'd';
pub(crate) const END: u8 = b'e';
pub(crate) const LENGTH_SEP: u8 = b':';
