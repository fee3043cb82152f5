use super::energy::ws_to_kwh;
use super::types::{AverageOutputs, PowerOutputs, RmsOutputs};

/*
* @brief Print the output of an average meter.
* @param data Last published average outputs.
* @param unit Physical unit of the channel.
*/
pub fn print_average(data: &AverageOutputs, unit: &str) {
    log::info!("Average: {:.3} {}", data.average, unit);
}

/*
* @brief Print the output of an RMS meter.
* @param data Last published RMS outputs.
* @param unit Physical unit of the channel.
*/
pub fn print_rms(data: &RmsOutputs, unit: &str) {
    log::info!("Signal:");
    log::info!("  Average: {:.3} {}", data.average, unit);
    log::info!("  Mean square: {:.3} {}²", data.mean_square, unit);
    log::info!("  RMS: {:.3} {}\n", data.rms, unit);
}

/*
* @brief Print voltage, current and power of a two channel meter.
* @param data Last published power outputs.
*/
pub fn print_power(data: &PowerOutputs) {
    log::info!("Voltage:");
    log::info!("  Average: {:.3} V", data.average1);
    log::info!("  RMS: {:.3} V", data.rms1);
    log::info!("Current:");
    log::info!("  Average: {:.3} A", data.average2);
    log::info!("  RMS: {:.3} A", data.rms2);
    log::info!("Power:");
    log::info!("  Real: {:.3} W", data.real_power);
    log::info!("  Apparent: {:.3} VA", data.apparent_power);
    log::info!("  Factor: {:.3}\n", data.power_factor);
}

/*
* @brief Print the energy totals of a two channel meter.
* @param data Last published power outputs.
*/
pub fn print_energy(data: &PowerOutputs) {
    log::info!("Energy:");
    log::info!("  Imported Energy: {:.6} kWh", ws_to_kwh(data.energy_imported));
    log::info!("  Exported Energy: {:.6} kWh", ws_to_kwh(data.energy_exported));
    log::info!("  Balance: {:.3} Ws\n", data.energy);
}
