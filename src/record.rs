use crate::ecowitt::Reading;

pub const FIELD_NAMES: [&str; 8] = [
    "field1", "field2", "field3", "field4", "field5", "field6", "field7", "field8",
];

/// The eight ThingSpeak channel fields, in channel order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputRecord {
    pub outdoor_temperature: String,
    pub outdoor_humidity: String,
    pub indoor_temperature: String,
    pub indoor_humidity: String,
    pub wind_speed: String,
    pub daily_rainfall: String,
    pub relative_pressure: String,
    pub solar_irradiance: String,
}

impl OutputRecord {
    pub fn slots(&self) -> [&str; 8] {
        [
            self.outdoor_temperature.as_str(),
            self.outdoor_humidity.as_str(),
            self.indoor_temperature.as_str(),
            self.indoor_humidity.as_str(),
            self.wind_speed.as_str(),
            self.daily_rainfall.as_str(),
            self.relative_pressure.as_str(),
            self.solar_irradiance.as_str(),
        ]
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        FIELD_NAMES.into_iter().zip(self.slots())
    }
}

/// Copies the relayed measurements verbatim. Values are never parsed or converted.
pub fn transform(reading: &Reading) -> OutputRecord {
    let data = &reading.data;
    OutputRecord {
        outdoor_temperature: data.outdoor.temperature.value.clone(),
        outdoor_humidity: data.outdoor.humidity.value.clone(),
        indoor_temperature: data.indoor.temperature.value.clone(),
        indoor_humidity: data.indoor.humidity.value.clone(),
        wind_speed: data.wind.wind_speed.value.clone(),
        daily_rainfall: data.rainfall.daily.value.clone(),
        relative_pressure: data.pressure.relative.value.clone(),
        solar_irradiance: data.solar_and_uvi.solar.value.clone(),
    }
}
