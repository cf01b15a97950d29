/// Schema of the case tracking store: design parameters and performance metrics

pub struct ParameterInfo {
    pub name: &'static str,
    pub unit: &'static str,
    /// Value used when a case omits the parameter. Metrics have no default.
    pub default: Option<f64>,
}

pub const DESIGN_PARAMETERS: &[ParameterInfo] = &[
    ParameterInfo {
        name: "fuel_mass_flow_rate",
        unit: "kg/s",
        default: Some(0.1),
    },
    ParameterInfo {
        name: "injection_speed_prim",
        unit: "m/s",
        default: Some(50.0),
    },
    ParameterInfo {
        name: "injection_speed_stage",
        unit: "m/s",
        default: Some(50.0),
    },
    ParameterInfo {
        name: "injector_width_stage",
        unit: "m",
        default: Some(0.1),
    },
    ParameterInfo {
        name: "injector_primary_diam",
        unit: "m",
        default: Some(0.05),
    },
    ParameterInfo {
        name: "equivalence_ratio",
        unit: "-",
        default: Some(0.7),
    },
    ParameterInfo {
        name: "inlet_temperature",
        unit: "K",
        default: Some(600.0),
    },
    ParameterInfo {
        name: "inlet_pressure",
        unit: "bar",
        default: Some(10.0),
    },
    ParameterInfo {
        name: "combustor_length",
        unit: "-",
        default: Some(0.6),
    },
];

pub const PERFORMANCE_METRICS: &[ParameterInfo] = &[
    ParameterInfo {
        name: "nox_emissions",
        unit: "ppm",
        default: None,
    },
    ParameterInfo {
        name: "co_emissions",
        unit: "ppm",
        default: None,
    },
    ParameterInfo {
        name: "soot_formation",
        unit: "ppm",
        default: None,
    },
    ParameterInfo {
        name: "temperature_max",
        unit: "K",
        default: None,
    },
    ParameterInfo {
        name: "temperature_avg",
        unit: "K",
        default: None,
    },
    ParameterInfo {
        name: "temperature_std",
        unit: "K",
        default: None,
    },
    ParameterInfo {
        name: "pressure_drop",
        unit: "%",
        default: None,
    },
    ParameterInfo {
        name: "combustion_efficiency",
        unit: "%",
        default: None,
    },
    ParameterInfo {
        name: "mixing_time",
        unit: "ms",
        default: None,
    },
];

pub fn get_design_parameter(name: &str) -> Option<&'static ParameterInfo> {
    DESIGN_PARAMETERS.iter().find(|p| p.name == name)
}

pub fn get_performance_metric(name: &str) -> Option<&'static ParameterInfo> {
    PERFORMANCE_METRICS.iter().find(|p| p.name == name)
}
