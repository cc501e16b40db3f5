pub(crate) mod compositor;
pub(crate) mod fingerprint;
pub(crate) mod frame;
