diesel::table! {
    appointments (id) {
        id -> BigInt,
        customer_name -> Text,
        time -> Text,
        duration -> BigInt,
        notes -> Text,
    }
}
