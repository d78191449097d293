// Esquema Diesel del almacén compartido de metadatos de segmentos.
// Tablas: process, lfn, segment_definer, state_segment
use diesel::allow_tables_to_appear_in_same_query;
diesel::table! {
    process (process_id) {
        process_id -> Text,
        program -> Text,
        version -> Text,
        cvs_repository -> Text,
        cvs_entry_time -> BigInt,
        is_online -> Integer,
        node -> Text,
        username -> Text,
        unix_procid -> Integer,
        start_time -> BigInt,
        end_time -> Nullable<BigInt>,
    }
}
diesel::table! {
    lfn (lfn_id) {
        process_id -> Text,
        lfn_id -> Text,
        #[sql_name = "lfn"]
        lfn_name -> Text,
        start_time -> BigInt,
        end_time -> BigInt,
    }
}
diesel::table! {
    segment_definer (segment_def_id) {
        process_id -> Text,
        segment_def_id -> Text,
        ifos -> Text,
        name -> Text,
        version -> Integer,
        comment -> Nullable<Text>,
        state_vec_major -> Nullable<Integer>,
        state_vec_minor -> Nullable<Integer>,
    }
}
diesel::table! {
    state_segment (segment_id) {
        process_id -> Text,
        segment_id -> Text,
        segment_def_id -> Text,
        start_time -> BigInt,
        start_time_ns -> Integer,
        end_time -> BigInt,
        end_time_ns -> Integer,
        lfn_id -> Text,
    }
}
diesel::joinable!(state_segment -> segment_definer (segment_def_id));
diesel::joinable!(state_segment -> lfn (lfn_id));
allow_tables_to_appear_in_same_query!(process, lfn, segment_definer, state_segment);
