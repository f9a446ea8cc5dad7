//! The shared power-system parameter table, as seen from the link stack.
//!
//! Both buses address the same table of 32-bit parameters by one-byte
//! address. Storage, scaling, and unit conversion live outside this crate;
//! the dispatch task only needs the [`Registers`] access trait and the
//! address map shared with the peers on either bus.

use thiserror::Error;

/// Errors reported by the register table.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    /// No parameter is mapped at this address.
    #[error("unknown register address {0:#04x}")]
    UnknownAddress(u8),
    /// The parameter exists but does not accept writes from the bus.
    #[error("write to register {0:#04x} rejected")]
    WriteRejected(u8),
}

/// Access to the table of power-system parameters.
///
/// Single-register reads and writes are atomic. In this design the table is
/// touched only from the dispatch task, never from interrupt context, so
/// implementations need no cross-context locking.
pub trait Registers {
    /// Reads the parameter at `addr`.
    fn read(&mut self, addr: u8) -> Result<u32, RegisterError>;

    /// Stores `value` into the parameter at `addr`.
    fn write(&mut self, addr: u8, value: u32) -> Result<(), RegisterError>;
}

/// Parameter addresses shared with the peers on both buses.
///
/// Values wider than 32 bits do not exist in the table; narrower ones are
/// zero-extended by the table implementation.
pub mod addr {
    /// Uptime counter in milliseconds.
    pub const TIME_COUNTER: u8 = 0;
    /// Controller MCU temperature in kelvin.
    pub const MCU_TEMP: u8 = 1;
    /// Supply current of the controller circuitry in mA.
    pub const SUPPLY_CURRENT: u8 = 2;
    /// Cause of the last MCU reset.
    pub const LAST_RESET_CAUSE: u8 = 3;
    /// MCU reset counter.
    pub const RESET_COUNTER: u8 = 4;
    /// -Y/+X solar panel pair voltage in mV.
    pub const SP_MY_PX_VOLTAGE: u8 = 5;
    /// -X/+Z solar panel pair voltage in mV.
    pub const SP_MX_PZ_VOLTAGE: u8 = 6;
    /// -Z/+Y solar panel pair voltage in mV.
    pub const SP_MZ_PY_VOLTAGE: u8 = 7;
    /// -Y solar panel current in mA.
    pub const SP_MY_CURRENT: u8 = 8;
    /// +Y solar panel current in mA.
    pub const SP_PY_CURRENT: u8 = 9;
    /// -X solar panel current in mA.
    pub const SP_MX_CURRENT: u8 = 10;
    /// +X solar panel current in mA.
    pub const SP_PX_CURRENT: u8 = 11;
    /// -Z solar panel current in mA.
    pub const SP_MZ_CURRENT: u8 = 12;
    /// +Z solar panel current in mA.
    pub const SP_PZ_CURRENT: u8 = 13;
    /// Tracker 1 converter duty cycle in percent.
    pub const MPPT_1_DUTY_CYCLE: u8 = 14;
    /// Tracker 2 converter duty cycle in percent.
    pub const MPPT_2_DUTY_CYCLE: u8 = 15;
    /// Tracker 3 converter duty cycle in percent.
    pub const MPPT_3_DUTY_CYCLE: u8 = 16;
    /// Combined solar panel voltage after the trackers in mV.
    pub const SP_VOLTAGE_MPPT: u8 = 17;
    /// Main power bus voltage in mV.
    pub const MAIN_BUS_VOLTAGE: u8 = 18;
    /// Temperature sensor 0 in kelvin.
    pub const RTD_0_TEMP: u8 = 19;
    /// Temperature sensor 1 in kelvin.
    pub const RTD_1_TEMP: u8 = 20;
    /// Temperature sensor 2 in kelvin.
    pub const RTD_2_TEMP: u8 = 21;
    /// Temperature sensor 3 in kelvin.
    pub const RTD_3_TEMP: u8 = 22;
    /// Temperature sensor 4 in kelvin.
    pub const RTD_4_TEMP: u8 = 23;
    /// Temperature sensor 5 in kelvin.
    pub const RTD_5_TEMP: u8 = 24;
    /// Temperature sensor 6 in kelvin.
    pub const RTD_6_TEMP: u8 = 25;
    /// Battery voltage in mV.
    pub const BAT_VOLTAGE: u8 = 26;
    /// Battery current in mA.
    pub const BAT_CURRENT: u8 = 27;
    /// Battery current averaged over the last eight samples, in mA.
    pub const BAT_AVERAGE_CURRENT: u8 = 28;
    /// Accumulated battery current in mA.
    pub const BAT_ACC_CURRENT: u8 = 29;
    /// Battery charge in mAh.
    pub const BAT_CHARGE: u8 = 30;
    /// Battery monitor IC temperature in kelvin.
    pub const BAT_MONITOR_TEMP: u8 = 31;
    /// Battery monitor status register.
    pub const BAT_MONITOR_STATUS: u8 = 32;
    /// Battery monitor protection register.
    pub const BAT_MONITOR_PROTECT: u8 = 33;
    /// Battery monitor charge/discharge cycle counter.
    pub const BAT_MONITOR_CYCLE_COUNTER: u8 = 34;
    /// Remaining active-absolute capacity in mAh.
    pub const BAT_MONITOR_RAAC: u8 = 35;
    /// Remaining standby-absolute capacity in mAh.
    pub const BAT_MONITOR_RSAC: u8 = 36;
    /// Remaining active-relative capacity in percent.
    pub const BAT_MONITOR_RARC: u8 = 37;
    /// Remaining standby-relative capacity in percent.
    pub const BAT_MONITOR_RSRC: u8 = 38;
    /// Battery heater 1 duty cycle in percent.
    pub const HEATER_1_DUTY_CYCLE: u8 = 39;
    /// Battery heater 2 duty cycle in percent.
    pub const HEATER_2_DUTY_CYCLE: u8 = 40;
    /// Hardware revision.
    pub const HW_VERSION: u8 = 41;
    /// Firmware revision.
    pub const FW_VERSION: u8 = 42;
    /// Tracker 1 mode flag.
    pub const MPPT_1_MODE: u8 = 43;
    /// Tracker 2 mode flag.
    pub const MPPT_2_MODE: u8 = 44;
    /// Tracker 3 mode flag.
    pub const MPPT_3_MODE: u8 = 45;
    /// Battery heater 1 mode flag.
    pub const HEATER_1_MODE: u8 = 46;
    /// Battery heater 2 mode flag.
    pub const HEATER_2_MODE: u8 = 47;
    /// Device identification word.
    pub const DEVICE_ID: u8 = 48;
}
