pub struct DefaultsConfig {
    pub catalog: &'static str,
    pub tbg: f64,
    pub fmin: f64,
    pub fmax: f64,
    pub geometry: &'static str,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            catalog: "jpl",
            tbg: 2.73,
            fmin: 0.0,
            fmax: 3.0e7,
            geometry: "sphere",
        }
    }
}
