// default values
pub fn get_default_routing_file() -> String {
    String::from("routing.json")
}

pub fn get_default_port() -> u16 {
    8080
}

pub fn get_default_health_check_timeout_secs() -> u64 {
    5
}

pub fn get_default_health_check_interval_secs() -> u64 {
    5
}

pub fn get_default_log_level() -> String {
    String::from("info")
}
