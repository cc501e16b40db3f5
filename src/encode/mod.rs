pub(crate) mod blob;
pub(crate) mod ffmpeg;
pub(crate) mod sink;
