pub mod geocode;
pub mod lookup;
pub mod sink;
pub mod step1_fetch;
pub mod step2_import;
pub mod step3_normalize;
pub mod step4_join;
pub mod step5_enrich;
pub mod step6_clean;
pub mod step7_publish;
