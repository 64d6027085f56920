pub mod d400_waybill_summary;
