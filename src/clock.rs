//! Two-thread clock driver.
//!
//! A *stepper* thread owns the machine (CPU + bus) outright and runs the
//! fetch/decode/execute loop, throttled to hardware speed one frame budget
//! at a time. A *pacer* thread wakes once per frame interval, snapshots the
//! shared frame buffer, and hands it to the screen collaborator. The only
//! cross-thread state is three atomic latches, the pause gate, and the
//! frame buffer; nothing else is shared.

use crate::cpu::{Cpu, CpuResult};
use crate::memory_bus::MemoryBus;
use crate::screen::{FRAME_SIZE, FrameBuffer, Screen};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// --- Timing ---
pub const CPU_FREQ_HZ: u64 = 4_194_304;
pub const TARGET_FPS: u64 = 60;
pub const TARGET_FRAME_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TARGET_FPS);
// CPU_FREQ_HZ / TARGET_FPS, the T-cycle budget of one frame
pub const CYCLES_PER_FRAME: u32 = 69_905;

/// The executor and its address space, bundled so one thread can own both.
pub struct Machine {
    pub cpu: Cpu,
    pub bus: MemoryBus,
}

impl Machine {
    pub fn new(cpu: Cpu, bus: MemoryBus) -> Self {
        Machine { cpu, bus }
    }

    #[inline(always)]
    pub fn step(&mut self) -> CpuResult<u16> {
        self.cpu.step(&mut self.bus)
    }
}

// Pause latch the stepper blocks on between steps.
struct PauseGate {
    paused: Mutex<bool>,
    cond: Condvar,
}

impl PauseGate {
    fn new() -> Self {
        PauseGate {
            paused: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Blocks while paused; a terminate request also releases the wait.
    fn wait_while_paused(&self, terminate: &AtomicBool) {
        let mut paused = self.paused.lock().expect("pause gate poisoned");
        while *paused && !terminate.load(Ordering::Acquire) {
            paused = self.cond.wait(paused).expect("pause gate poisoned");
        }
    }
}

/// Drives the machine: construct → `start` → optional `pause`/`resume` →
/// `terminate` → `join`. Misuse (double start, resume while running) is a
/// no-op. After terminate + join the machine is back in the driver and no
/// thread holds any reference to it.
pub struct ClockDriver {
    started: Arc<AtomicBool>,
    terminate: Arc<AtomicBool>,
    gate: Arc<PauseGate>,
    frame: FrameBuffer,

    // Owned here until start() moves them into the threads, and (for the
    // machine) again after join().
    machine: Option<Machine>,
    screen: Option<Box<dyn Screen + Send>>,

    stepper: Option<JoinHandle<(Machine, Option<String>)>>,
    pacer: Option<JoinHandle<()>>,
    fatal: Option<String>,
}

impl ClockDriver {
    pub fn new(machine: Machine, screen: Box<dyn Screen + Send>) -> Self {
        ClockDriver {
            started: Arc::new(AtomicBool::new(false)),
            terminate: Arc::new(AtomicBool::new(false)),
            gate: Arc::new(PauseGate::new()),
            frame: FrameBuffer::new(),
            machine: Some(machine),
            screen: Some(screen),
            stepper: None,
            pacer: None,
            fatal: None,
        }
    }

    /// Handle the graphics collaborator publishes frames through.
    pub fn frame_buffer(&self) -> FrameBuffer {
        self.frame.clone()
    }

    /// Spawns the stepper and pacer threads. Calling again is a no-op.
    pub fn start(&mut self) {
        if self.started.swap(true, Ordering::AcqRel) {
            log::warn!("clock driver already started, ignoring");
            return;
        }
        let machine = self
            .machine
            .take()
            .expect("machine present on first start");
        let screen = self.screen.take().expect("screen present on first start");

        self.stepper = Some(self.spawn_stepper(machine));
        self.pacer = Some(self.spawn_pacer(screen));
        log::info!("clock driver started");
    }

    fn spawn_stepper(&self, mut machine: Machine) -> JoinHandle<(Machine, Option<String>)> {
        let terminate = Arc::clone(&self.terminate);
        let gate = Arc::clone(&self.gate);
        thread::spawn(move || {
            let mut frame_cycles: u32 = 0;
            let mut frame_start = Instant::now();
            let fatal = loop {
                if terminate.load(Ordering::Acquire) {
                    break None;
                }
                gate.wait_while_paused(&terminate);
                if terminate.load(Ordering::Acquire) {
                    break None;
                }
                match machine.step() {
                    Ok(cycles) => {
                        frame_cycles += cycles as u32;
                        if frame_cycles >= CYCLES_PER_FRAME {
                            // Frame budget spent; sleep off the surplus so
                            // emulated time tracks wall time.
                            frame_cycles -= CYCLES_PER_FRAME;
                            let elapsed = frame_start.elapsed();
                            if elapsed < TARGET_FRAME_DURATION {
                                thread::sleep(TARGET_FRAME_DURATION - elapsed);
                            }
                            frame_start = Instant::now();
                        }
                    }
                    Err(cause) => {
                        // Already logged by the executor; shut both threads
                        // down and keep the cause for after join.
                        terminate.store(true, Ordering::Release);
                        break Some(cause);
                    }
                }
            };
            (machine, fatal)
        })
    }

    fn spawn_pacer(&self, mut screen: Box<dyn Screen + Send>) -> JoinHandle<()> {
        let terminate = Arc::clone(&self.terminate);
        let frame = self.frame.clone();
        thread::spawn(move || {
            let mut scratch = Box::new([0u8; FRAME_SIZE]);
            while !terminate.load(Ordering::Acquire) {
                thread::sleep(TARGET_FRAME_DURATION);
                frame.snapshot(&mut scratch);
                screen.draw(&scratch);
            }
        })
    }

    /// Gates the stepper at its next step boundary.
    pub fn pause(&self) {
        let mut paused = self.gate.paused.lock().expect("pause gate poisoned");
        if *paused {
            return;
        }
        *paused = true;
    }

    /// Releases a paused stepper. Without a prior `pause` this is a no-op.
    pub fn resume(&self) {
        let mut paused = self.gate.paused.lock().expect("pause gate poisoned");
        if !*paused {
            return;
        }
        *paused = false;
        self.gate.cond.notify_all();
    }

    /// Requests cooperative shutdown; both threads exit at their next loop
    /// boundary.
    pub fn terminate(&self) {
        self.terminate.store(true, Ordering::Release);
        // Wake the stepper if it is parked on the pause gate.
        self.gate.cond.notify_all();
    }

    /// Waits for both threads and reclaims the machine. The stepper's fatal
    /// cause, if any, is readable afterwards via `last_fault`.
    pub fn join(&mut self) {
        if let Some(handle) = self.stepper.take() {
            match handle.join() {
                Ok((machine, fatal)) => {
                    self.machine = Some(machine);
                    self.fatal = fatal;
                }
                Err(_) => {
                    self.fatal = Some("stepper thread panicked".to_string());
                }
            }
        }
        if let Some(handle) = self.pacer.take() {
            if handle.join().is_err() {
                log::error!("pacer thread panicked");
            }
        }
    }

    /// The cause that stopped the stepper, if it died on a CPU fault.
    pub fn last_fault(&self) -> Option<&str> {
        self.fatal.as_deref()
    }

    /// The machine, available before `start` and again after `join`.
    pub fn machine(&self) -> Option<&Machine> {
        self.machine.as_ref()
    }
}

impl Drop for ClockDriver {
    fn drop(&mut self) {
        self.terminate();
        self.join();
    }
}
