//! TWAI controller driver over the multi-controller (`_v2`) ESP-IDF API

use std::ptr;
use std::time::Duration;

use esp_idf_svc::sys::{self, esp, EspError};
use log::{info, warn};

use super::ticks;
use crate::can::{id_from_raw, BusConfig, CanBus, Frame};
use crate::error::{Error, Result};

/// One installed TWAI controller
pub struct TwaiBus {
    handle: sys::twai_handle_t,
    controller: u8,
    started: bool,
}

// The driver handle is only used from the thread owning the bus
unsafe impl Send for TwaiBus {}

impl TwaiBus {
    /// Install the driver for `config.controller`. Failure here is fatal for the firmware.
    pub fn install(config: &BusConfig) -> Result<Self> {
        let controller = config.controller;

        let general = sys::twai_general_config_t {
            controller_id: config.controller as _,
            mode: sys::twai_mode_t_TWAI_MODE_NORMAL,
            tx_io: config.tx_pin,
            rx_io: config.rx_pin,
            clkout_io: -1,
            bus_off_io: -1,
            tx_queue_len: config.tx_queue_len,
            rx_queue_len: config.rx_queue_len,
            alerts_enabled: sys::TWAI_ALERT_NONE,
            clkout_divider: 0,
            intr_flags: sys::ESP_INTR_FLAG_LEVEL1 as _,
            ..Default::default()
        };

        let preset = config.timing;
        let timing = sys::twai_timing_config_t {
            quanta_resolution_hz: preset.quanta_resolution_hz,
            brp: 0,
            tseg_1: preset.tseg_1,
            tseg_2: preset.tseg_2,
            sjw: preset.sjw,
            triple_sampling: preset.triple_sampling,
            ..Default::default()
        };

        let filter = sys::twai_filter_config_t {
            acceptance_code: config.filter.code,
            acceptance_mask: config.filter.mask,
            single_filter: config.filter.single,
        };

        let mut handle: sys::twai_handle_t = ptr::null_mut();
        esp!(unsafe { sys::twai_driver_install_v2(&general, &timing, &filter, &mut handle) })
            .map_err(|e| Error::BusConfig {
                controller,
                code: e.code(),
            })?;

        info!(
            "TWAI{} installed: TX {} RX {} at {} bit/s",
            controller,
            config.tx_pin,
            config.rx_pin,
            config.timing.bits_per_second()
        );

        Ok(Self {
            handle,
            controller,
            started: false,
        })
    }

    /// Start taking part in bus traffic
    pub fn start(&mut self) -> Result<()> {
        esp!(unsafe { sys::twai_start_v2(self.handle) }).map_err(|e| Error::BusStart {
            controller: self.controller,
            code: e.code(),
        })?;
        self.started = true;
        info!("TWAI{} started", self.controller);
        Ok(())
    }
}

impl CanBus for TwaiBus {
    fn receive(&mut self, timeout: Option<Duration>) -> Result<Frame> {
        let mut message = sys::twai_message_t::default();
        let err = unsafe { sys::twai_receive_v2(self.handle, &mut message, ticks(timeout)) };

        match EspError::from(err) {
            None => {
                let flags = unsafe { message.__bindgen_anon_1.flags };
                let id = id_from_raw(message.identifier, flags & sys::TWAI_MSG_FLAG_EXTD != 0).ok_or(
                    Error::Receive {
                        controller: self.controller,
                        code: sys::ESP_ERR_INVALID_RESPONSE as i32,
                    },
                )?;
                Ok(Frame::from_raw(id, message.data_length_code, message.data))
            }
            Some(e) if e.code() == sys::ESP_ERR_TIMEOUT as i32 => Err(Error::Timeout),
            Some(e) => Err(Error::Receive {
                controller: self.controller,
                code: e.code(),
            }),
        }
    }

    fn controller(&self) -> u8 {
        self.controller
    }
}

impl Drop for TwaiBus {
    fn drop(&mut self) {
        if self.started {
            if let Err(e) = esp!(unsafe { sys::twai_stop_v2(self.handle) }) {
                warn!("TWAI{} stop failed: {}", self.controller, e);
            }
        }
        if let Err(e) = esp!(unsafe { sys::twai_driver_uninstall_v2(self.handle) }) {
            warn!("TWAI{} uninstall failed: {}", self.controller, e);
        }
    }
}
