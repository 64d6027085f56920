pub mod a001_project;
pub mod a002_supplier;
pub mod a003_waybill;
pub mod a004_import_job;
pub mod a006_import_audit;
pub mod d400_waybill_summary;
