pub(crate) mod mp3;
pub(crate) mod wav;
pub(crate) mod waveform;
