#![allow(dead_code)]
//! Test doubles simulating an MCP2515 behind an SPI bus, plus a recording delay.
//!
//! The simulated chip keeps a register file, three TX buffers, and two RX
//! buffers, and logs every SPI transaction and delay in one ordered event list.
use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{ErrorKind, ErrorType, Operation, SpiDevice};
use std::sync::{Arc, Mutex, MutexGuard};

pub const CANSTAT: u8 = 0x0E;
pub const CANCTRL: u8 = 0x0F;
pub const CNF3: u8 = 0x28;
pub const CNF2: u8 = 0x29;
pub const CNF1: u8 = 0x2A;
pub const CANINTE: u8 = 0x2B;
pub const CANINTF: u8 = 0x2C;
pub const EFLG: u8 = 0x2D;
pub const RXB0CTRL: u8 = 0x60;
pub const RXB1CTRL: u8 = 0x70;

#[derive(Clone, Debug, PartialEq)]
/// One observable interaction with the hardware.
pub enum Event {
    /// MOSI bytes of one SPI transaction.
    Spi(Vec<u8>),
    /// Blocking delay, in milliseconds.
    Delay(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Injected link failure.
pub struct LinkDown;

impl embedded_hal::spi::Error for LinkDown {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// A frame as it left a TX buffer, decoded with the datasheet layout.
pub struct WireFrame {
    pub buffer: usize,
    pub id: u32,
    pub extended: bool,
    pub data: [u8; 8],
    pub dlc: usize,
}

impl WireFrame {
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.dlc]
    }
}

/// Internal chip state.
pub struct ChipState {
    pub regs: [u8; 0x80],
    pub tx_pending: [bool; 3],
    pub tx_buffers: [[u8; 13]; 3],
    pub rx_buffers: [Option<(bool, [u8; 13])>; 2],
    pub transmitted: Vec<WireFrame>,
    pub events: Vec<Event>,
    /// CANSTAT never follows CANCTRL.
    pub mode_stuck: bool,
    /// Every transaction fails.
    pub link_down: bool,
    /// RTS puts the frame on the wire at once, leaving the buffer free.
    pub auto_complete: bool,
    pub canstat_reads: usize,
}

impl ChipState {
    fn power_on() -> Self {
        let mut state = Self {
            regs: [0; 0x80],
            tx_pending: [false; 3],
            tx_buffers: [[0; 13]; 3],
            rx_buffers: [None, None],
            transmitted: Vec::new(),
            events: Vec::new(),
            mode_stuck: false,
            link_down: false,
            auto_complete: false,
            canstat_reads: 0,
        };
        state.reset();
        state
    }

    fn reset(&mut self) {
        self.regs = [0; 0x80];
        self.regs[CANSTAT as usize] = 0x80;
        self.regs[CANCTRL as usize] = 0x87;
        self.tx_pending = [false; 3];
        self.rx_buffers = [None, None];
    }

    fn read_reg(&mut self, addr: u8) -> u8 {
        if addr == CANSTAT {
            self.canstat_reads += 1;
        }
        self.regs[(addr & 0x7F) as usize]
    }

    fn write_reg(&mut self, addr: u8, value: u8) {
        self.regs[(addr & 0x7F) as usize] = value;
        match addr {
            CANCTRL if !self.mode_stuck => {
                let canstat = &mut self.regs[CANSTAT as usize];
                *canstat = (*canstat & 0x1F) | (value & 0xE0);
            }
            CANINTF => {
                for (index, flag) in [0x01u8, 0x02].iter().enumerate() {
                    if value & flag == 0 {
                        self.rx_buffers[index] = None;
                    }
                }
            }
            _ => {}
        }
    }

    fn read_status(&self) -> u8 {
        let mut status = self.regs[CANINTF as usize] & 0x03;
        for (index, mask) in [0x04u8, 0x10, 0x40].iter().enumerate() {
            if self.tx_pending[index] {
                status |= mask;
            }
        }
        status
    }

    fn rx_status(&self) -> u8 {
        let flags = self.regs[CANINTF as usize] & 0x03;
        let first = if flags & 0x01 != 0 { 0 } else { 1 };
        let extended = flags != 0 && self.rx_buffers[first].map(|(ext, _)| ext).unwrap_or(false);
        flags | if extended { 0x08 } else { 0x00 }
    }

    fn execute(&mut self, mosi: &[u8]) -> Vec<u8> {
        let mut miso = vec![0u8; mosi.len()];
        match mosi[0] {
            0xC0 => self.reset(),
            0x03 => {
                for i in 2..mosi.len() {
                    miso[i] = self.read_reg(mosi[1].wrapping_add((i - 2) as u8));
                }
            }
            0x02 => {
                for (offset, value) in mosi[2..].iter().enumerate() {
                    self.write_reg(mosi[1].wrapping_add(offset as u8), *value);
                }
            }
            0x05 => {
                let (addr, mask, value) = (mosi[1], mosi[2], mosi[3]);
                let current = self.regs[(addr & 0x7F) as usize];
                self.write_reg(addr, (current & !mask) | (value & mask));
            }
            op @ (0x40 | 0x42 | 0x44) => {
                let index = ((op - 0x40) / 2) as usize;
                let mut buffer = [0u8; 13];
                buffer[..mosi.len() - 1].copy_from_slice(&mosi[1..]);
                self.tx_buffers[index] = buffer;
            }
            op @ 0x81..=0x87 => {
                for index in 0..3 {
                    if op & (1 << index) != 0 {
                        self.transmitted
                            .push(decode_wire(index, &self.tx_buffers[index]));
                        self.tx_pending[index] = !self.auto_complete;
                    }
                }
            }
            0xA0 => {
                let status = self.read_status();
                miso[1..].iter_mut().for_each(|b| *b = status);
            }
            0xB0 => {
                let status = self.rx_status();
                miso[1..].iter_mut().for_each(|b| *b = status);
            }
            op @ (0x90 | 0x94) => {
                let index = ((op - 0x90) / 4) as usize;
                let bytes = self.rx_buffers[index].map(|(_, b)| b).unwrap_or([0; 13]);
                let n = (mosi.len() - 1).min(13);
                miso[1..=n].copy_from_slice(&bytes[..n]);
            }
            _ => {}
        }
        miso
    }
}

/// Datasheet identifier layout, written independently of the driver's codec.
pub fn id_registers(id: u32, extended: bool) -> [u8; 4] {
    if extended {
        [
            (id >> 21) as u8,
            ((((id >> 18) & 0x07) << 5) as u8) | 0x08 | ((id >> 16) & 0x03) as u8,
            (id >> 8) as u8,
            id as u8,
        ]
    } else {
        [(id >> 3) as u8, ((id & 0x07) << 5) as u8, 0, 0]
    }
}

fn decode_wire(buffer: usize, raw: &[u8; 13]) -> WireFrame {
    let extended = raw[1] & 0x08 != 0;
    let sid = ((raw[0] as u32) << 3) | ((raw[1] as u32) >> 5);
    let id = if extended {
        (sid << 18) | (((raw[1] & 0x03) as u32) << 16) | ((raw[2] as u32) << 8) | raw[3] as u32
    } else {
        sid
    };
    let dlc = (raw[4] & 0x0F).min(8) as usize;
    let mut data = [0u8; 8];
    data.copy_from_slice(&raw[5..13]);
    WireFrame {
        buffer,
        id,
        extended,
        data,
        dlc,
    }
}

#[derive(Clone)]
/// Test-side handle on the simulated chip.
pub struct Chip(Arc<Mutex<ChipState>>);

impl Chip {
    /// Fresh chip plus the SPI device and delay wired to it.
    pub fn new() -> (Self, FakeSpi, FakeDelay) {
        let shared = Arc::new(Mutex::new(ChipState::power_on()));
        (
            Chip(shared.clone()),
            FakeSpi(shared.clone()),
            FakeDelay(shared),
        )
    }

    pub fn state(&self) -> MutexGuard<'_, ChipState> {
        self.0.lock().unwrap()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state().events.clone()
    }

    /// MOSI bytes of every SPI transaction so far.
    pub fn transactions(&self) -> Vec<Vec<u8>> {
        self.state()
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Spi(bytes) => Some(bytes.clone()),
                Event::Delay(_) => None,
            })
            .collect()
    }

    pub fn clear_log(&self) {
        self.state().events.clear();
    }

    pub fn reg(&self, addr: u8) -> u8 {
        self.state().regs[addr as usize]
    }

    pub fn set_reg(&self, addr: u8, value: u8) {
        self.state().regs[addr as usize] = value;
    }

    pub fn set_tx_pending(&self, pending: [bool; 3]) {
        self.state().tx_pending = pending;
    }

    /// The bus acknowledged every pending frame.
    pub fn complete_transmissions(&self) {
        self.state().tx_pending = [false; 3];
    }

    pub fn transmitted(&self) -> Vec<WireFrame> {
        self.state().transmitted.clone()
    }

    /// A frame arrives from the bus into RX buffer `index`.
    pub fn inject_rx(&self, index: usize, id: u32, extended: bool, data: &[u8]) {
        let mut raw = [0u8; 13];
        raw[..4].copy_from_slice(&id_registers(id, extended));
        raw[4] = data.len() as u8;
        raw[5..5 + data.len()].copy_from_slice(data);
        let mut state = self.state();
        state.rx_buffers[index] = Some((extended, raw));
        state.regs[CANINTF as usize] |= 1 << index;
    }

    pub fn rx_full(&self, index: usize) -> bool {
        self.state().rx_buffers[index].is_some()
    }
}

/// `SpiDevice` executing each transaction against the simulated chip.
pub struct FakeSpi(Arc<Mutex<ChipState>>);

impl ErrorType for FakeSpi {
    type Error = LinkDown;
}

impl SpiDevice for FakeSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), LinkDown> {
        let mut state = self.0.lock().unwrap();
        if state.link_down {
            return Err(LinkDown);
        }
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    state.events.push(Event::Spi(bytes.to_vec()));
                    state.execute(&bytes[..]);
                }
                Operation::TransferInPlace(buf) => {
                    state.events.push(Event::Spi(buf.to_vec()));
                    let miso = state.execute(&buf[..]);
                    buf.copy_from_slice(&miso);
                }
                Operation::Transfer(read, write) => {
                    state.events.push(Event::Spi(write.to_vec()));
                    let miso = state.execute(&write[..]);
                    let n = read.len().min(miso.len());
                    read[..n].copy_from_slice(&miso[..n]);
                }
                Operation::Read(_) | Operation::DelayNs(_) => {}
            }
        }
        Ok(())
    }
}

/// `DelayNs` that only records the requested pause.
pub struct FakeDelay(Arc<Mutex<ChipState>>);

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.lock().unwrap().events.push(Event::Delay(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.lock().unwrap().events.push(Event::Delay(ms));
    }
}
