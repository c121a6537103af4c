//! Backend API paths, relative to the configured base URL

/// User account endpoints
pub mod user {
    pub const REGISTER: &str = "/api/user/register/";
    pub const LOGIN: &str = "/api/user/login/";
    pub const PROFILE: &str = "/api/user/profile/";
    pub const RESET_PASSWORD: &str = "/api/user/send-reset-password-email/";
}

/// Token management endpoints
pub mod token {
    pub const REFRESH: &str = "/api/token/refresh/";
}

/// Flood management endpoints. Path spellings follow the backend routes.
pub mod flood {
    pub const HELP: &str = "/api/floodmanagement/help/";
    pub const HELP_LIST: &str = "/api/floodmanagement/helplist/";
    pub const CROWDSOURCE: &str = "/api/floodmanagement/crowdsource/";
    pub const CROWDSOURCE_LIST: &str = "/api/floodmanagement/crowdsourcelist/";
    pub const FORECAST: &str = "/api/floodmanagement/forcast/";
    pub const FORECAST_MAP: &str = "/api/floodmanagement/forcastmap/";
    pub const TIPS: &str = "/api/floodmanagement/tips/";
    pub const SAFETY_CHECK: &str = "/api/floodmanagement/saftycheck/";
    pub const INUNDATION: &str = "/api/floodmanagement/inundation/";
    pub const BROADCAST: &str = "/api/floodmanagement/broadcast/";

    pub fn help_details(id: u64) -> String {
        format!("/api/floodmanagement/helpdetails/{id}/")
    }

    pub fn crowdsource_details(id: u64) -> String {
        format!("/api/floodmanagement/crowdsourcedetails/{id}/")
    }
}
