pub(crate) mod export_job;
