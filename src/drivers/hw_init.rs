//! One-shot hardware peripheral initialization.
//!
//! Configures the LEDC timer and one channel per valve servo, and the
//! flow-sensor GPIO inputs with their falling-edge interrupts, using raw
//! ESP-IDF sys calls.  Called once from `main()` before the control loop
//! starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

use embedded_hal::pwm::{self, ErrorKind, ErrorType, SetDutyCycle};

use crate::config::{ChannelConfig, MAX_CHANNELS};
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    LedcInitFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    UartInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::UartInitFailed(rc) => write!(f, "UART driver install failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

// ── LEDC servo PWM ────────────────────────────────────────────

/// Maximum duty at [`pins::SERVO_PWM_RESOLUTION_BITS`].
pub const SERVO_MAX_DUTY: u16 = ((1u32 << pins::SERVO_PWM_RESOLUTION_BITS) - 1) as u16;

/// Duty register write rejected by the LEDC driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedcWriteError(pub i32);

impl pwm::Error for LedcWriteError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// One LEDC channel driving a servo signal line.
///
/// On ESP-IDF the duty goes straight to the LEDC registers; on the host
/// it is only kept in memory.
#[derive(Debug)]
pub struct LedcServoChannel {
    channel: u32,
    duty: u16,
}

impl LedcServoChannel {
    pub fn channel(&self) -> u32 {
        self.channel
    }

    /// Last duty written.
    pub fn duty(&self) -> u16 {
        self.duty
    }
}

impl ErrorType for LedcServoChannel {
    type Error = LedcWriteError;
}

impl SetDutyCycle for LedcServoChannel {
    fn max_duty_cycle(&self) -> u16 {
        SERVO_MAX_DUTY
    }

    #[cfg(target_os = "espidf")]
    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        // SAFETY: the channel was configured in init_servo_pwm(); only the
        // control loop writes its duty register.
        let ret = unsafe { ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, self.channel, duty as u32) };
        if ret != ESP_OK as i32 {
            return Err(LedcWriteError(ret));
        }
        let ret = unsafe { ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, self.channel) };
        if ret != ESP_OK as i32 {
            return Err(LedcWriteError(ret));
        }
        self.duty = duty;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty = duty;
        Ok(())
    }
}

/// Configure the 50 Hz servo timer and one channel per active valve.
#[cfg(target_os = "espidf")]
pub fn init_servo_pwm(count: usize) -> Result<heapless::Vec<LedcServoChannel, MAX_CHANNELS>, HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: pins::SERVO_PWM_RESOLUTION_BITS,
        freq_hz: pins::SERVO_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: called once from main() before the control loop starts.
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    let mut channels = heapless::Vec::new();
    for (index, &gpio) in pins::SERVO_GPIOS.iter().take(count).enumerate() {
        let channel = ledc_channel_t_LEDC_CHANNEL_0 + index as u32;
        let ret = unsafe {
            ledc_channel_config(&ledc_channel_config_t {
                speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
                channel,
                timer_sel: ledc_timer_t_LEDC_TIMER_0,
                gpio_num: gpio,
                duty: 0,
                hpoint: 0,
                ..Default::default()
            })
        };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::LedcInitFailed(ret));
        }
        let _ = channels.push(LedcServoChannel { channel, duty: 0 });
    }

    info!("hw_init: servo LEDC configured ({} channel(s), 50 Hz)", channels.len());
    Ok(channels)
}

#[cfg(not(target_os = "espidf"))]
pub fn init_servo_pwm(count: usize) -> Result<heapless::Vec<LedcServoChannel, MAX_CHANNELS>, HwInitError> {
    let mut channels = heapless::Vec::new();
    for index in 0..count.min(MAX_CHANNELS) {
        let _ = channels.push(LedcServoChannel {
            channel: index as u32,
            duty: 0,
        });
    }
    log::info!("hw_init(sim): {} servo channel(s) in memory", channels.len());
    Ok(channels)
}

// ── Flow sensor inputs + ISR ──────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn flow_gpio_isr(arg: *mut core::ffi::c_void) {
    crate::sensors::flow::flow_isr_handler(arg as usize);
}

/// Configure one pulse input per active channel and route its falling
/// edge to the matching [`FLOW_PULSES`](crate::sensors::FLOW_PULSES)
/// counter.
#[cfg(target_os = "espidf")]
pub fn init_flow_inputs(channels: &[ChannelConfig]) -> Result<(), HwInitError> {
    // SAFETY: called once from main() before the control loop starts.  The
    // ISR only increments an atomic counter.
    unsafe {
        let ret = gpio_install_isr_service(0);
        // ESP_ERR_INVALID_STATE: already installed.
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        for (index, ch) in channels.iter().take(MAX_CHANNELS).enumerate() {
            let pin = pins::FLOW_GPIOS[index];
            let cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pin,
                mode: gpio_mode_t_GPIO_MODE_INPUT,
                pull_up_en: if ch.pull_up {
                    gpio_pullup_t_GPIO_PULLUP_ENABLE
                } else {
                    gpio_pullup_t_GPIO_PULLUP_DISABLE
                },
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
            };
            let ret = gpio_config(&cfg);
            if ret != ESP_OK as i32 {
                return Err(HwInitError::GpioConfigFailed(ret));
            }

            let ret = gpio_isr_handler_add(pin, Some(flow_gpio_isr), index as *mut core::ffi::c_void);
            if ret != ESP_OK as i32 {
                return Err(HwInitError::IsrInstallFailed(ret));
            }
            gpio_intr_enable(pin);
        }
    }
    info!("hw_init: {} flow input(s) on falling edge", channels.len().min(MAX_CHANNELS));
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_flow_inputs(channels: &[ChannelConfig]) -> Result<(), HwInitError> {
    log::info!(
        "hw_init(sim): {} flow input(s) skipped",
        channels.len().min(MAX_CHANNELS)
    );
    Ok(())
}
