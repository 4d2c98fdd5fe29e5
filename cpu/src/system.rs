//! The whole emulated system: main storage, the bank descriptor
//! table and the instruction processors which share them.
use std::sync::Arc;
use std::thread;

use tracing::{event, span, Level};

use base::prelude::*;

use super::basereg::{BankDescriptor, BankDescriptorTable};
use super::config::{ConfigurationError, SystemConfiguration};
use super::image::{LoadError, ProgramImage};
use super::memory::MainStorage;
use super::processor::{InstructionProcessor, ProcessorStatus};
use super::registers::LevelBdi;
use super::upi::{SendOutcome, SignalChannel, SignalError};

#[derive(Debug)]
pub struct System {
    storage: Arc<MainStorage>,
    banks: Arc<BankDescriptorTable>,
    channel: SignalChannel,
    processors: Vec<InstructionProcessor>,
}

impl System {
    /// Build a system as described by `config`, place the banks of
    /// `image` in storage one after another, and load every processor
    /// ready to run the image.  The processors are not started.
    pub fn load(config: &SystemConfiguration, image: &ProgramImage) -> Result<System, LoadError> {
        config.validate()?;
        image.validate()?;

        let needed: usize = image.banks().iter().map(|bank| bank.words.len()).sum();
        if needed > config.storage_words {
            return Err(LoadError::InsufficientStorage {
                needed,
                available: config.storage_words,
            });
        }
        let storage = MainStorage::new(config.storage_words);
        let mut table = BankDescriptorTable::new();
        let mut base_address = 0;
        for bank in image.banks() {
            storage.load(base_address, &bank.words)?;
            table.insert(BankDescriptor {
                level_bdi: bank.level_bdi,
                bank_type: bank.bank_type,
                base_address,
                lower_limit: bank.lower_limit,
                upper_limit: bank.upper_limit(),
                access_lock: bank.access_lock,
                general_permissions: bank.general_permissions,
                special_permissions: bank.special_permissions,
                large_size: bank.large_size,
            })?;
            event!(
                Level::DEBUG,
                "bank {} ({} words) loaded at absolute address {base_address:o}",
                bank.level_bdi,
                bank.words.len()
            );
            base_address += bank.words.len();
        }

        let storage = Arc::new(storage);
        let banks = Arc::new(table);
        let channel = SignalChannel::new(config.processor_count);
        let mut processors = Vec::with_capacity(config.processor_count);
        for index in 0..config.processor_count {
            let upi = u8::try_from(index).map_err(|_| {
                LoadError::Configuration(ConfigurationError::TooManyProcessors(
                    config.processor_count,
                ))
            })?;
            let mut processor = InstructionProcessor::new(
                upi,
                config.processor.clone(),
                Arc::clone(&storage),
                Arc::clone(&banks),
                channel.clone(),
            )?;
            processor.initial_program_load(image)?;
            processors.push(processor);
        }
        event!(
            Level::INFO,
            "loaded {} banks ({needed} words) for {} processors",
            banks.len(),
            processors.len()
        );
        Ok(System {
            storage,
            banks,
            channel,
            processors,
        })
    }

    pub fn processors(&self) -> &[InstructionProcessor] {
        &self.processors
    }

    pub fn processor(&self, upi: u8) -> Option<&InstructionProcessor> {
        self.processors.get(usize::from(upi))
    }

    pub fn processor_mut(&mut self, upi: u8) -> Option<&mut InstructionProcessor> {
        self.processors.get_mut(usize::from(upi))
    }

    /// Start one processor.  Returns false if there is no such
    /// processor.
    pub fn start(&mut self, upi: u8) -> bool {
        match self.processor_mut(upi) {
            Some(processor) => {
                processor.start();
                true
            }
            None => false,
        }
    }

    pub fn start_all(&mut self) {
        for processor in self.processors.iter_mut() {
            processor.start();
        }
    }

    /// Run every started processor, each on its own thread, until all
    /// of them have stopped.
    pub fn run(&mut self) {
        let span = span!(Level::INFO, "run");
        let _enter = span.enter();
        thread::scope(|scope| {
            for processor in self.processors.iter_mut().filter(|p| p.is_running()) {
                scope.spawn(move || processor.run());
            }
        });
        event!(Level::INFO, "all processors have stopped");
    }

    /// Send a UPI interrupt from one processor to another, as the SEND
    /// instruction does.
    pub fn send(&self, from: u8, to: u8) -> Result<SendOutcome, SignalError> {
        self.channel.send(from, to)
    }

    pub fn bank_descriptor(&self, level_bdi: LevelBdi) -> Option<&BankDescriptor> {
        self.banks.lookup(level_bdi)
    }

    /// Read a word of a bank by its relative address.
    pub fn read_bank_word(&self, level_bdi: LevelBdi, relative: u32) -> Option<Word36> {
        let bank = self.banks.lookup(level_bdi)?;
        if relative < bank.lower_limit || relative > bank.upper_limit {
            return None;
        }
        let absolute = bank.base_address + (relative - bank.lower_limit) as usize;
        self.storage.read(absolute).ok()
    }

    pub fn status(&self) -> Vec<ProcessorStatus> {
        self.processors.iter().map(InstructionProcessor::status).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{BankImage, ProgramStart};
    use crate::stop::StopReason;

    fn halt(detail: u16) -> Word36 {
        InstructionWord::extended(0o77, 0o17, 0o17, 0, false, false, 0, detail).word()
    }

    fn image(words: Vec<Word36>) -> ProgramImage {
        let code = LevelBdi::new(0, 0o100);
        ProgramImage::new(ProgramStart::extended(code, 0o1000))
            .with_bank(BankImage::extended(code, 0o1000, words).based_on(0))
            .with_interrupt_environment()
    }

    #[test]
    fn test_load_places_banks_consecutively() {
        let config = SystemConfiguration::default();
        let system = System::load(&config, &image(vec![halt(0), halt(1)])).expect("loads");
        let code = system
            .bank_descriptor(LevelBdi::new(0, 0o100))
            .expect("code bank is defined");
        assert_eq!(code.base_address, 0);
        assert_eq!((code.lower_limit, code.upper_limit), (0o1000, 0o1001));
        let vectors = system
            .bank_descriptor(LevelBdi::new(0, 1))
            .expect("vector bank is defined");
        assert_eq!(vectors.base_address, 2);
        assert_eq!(
            system.read_bank_word(LevelBdi::new(0, 0o100), 0o1001),
            Some(halt(1))
        );
        assert_eq!(system.read_bank_word(LevelBdi::new(0, 0o100), 0o1002), None);
    }

    #[test]
    fn test_large_size_flag_reaches_base_register() {
        let data = LevelBdi::new(0, 0o101);
        let image = image(vec![halt(0)])
            .with_bank(BankImage::extended(data, 0, vec![Word36::ZERO]).large().based_on(2));
        let system = System::load(&SystemConfiguration::default(), &image).expect("loads");
        assert!(system.bank_descriptor(data).expect("data bank is defined").large_size);
        let ip = system.processor(0).expect("processor 0 exists");
        assert!(ip.base_register(2).expect("B2 exists").large_size);
        assert!(!ip.base_register(0).expect("B0 exists").large_size);
    }

    #[test]
    fn test_load_rejects_oversized_image() {
        let config = SystemConfiguration {
            storage_words: 100,
            ..SystemConfiguration::default()
        };
        match System::load(&config, &image(vec![halt(0)])) {
            Err(LoadError::InsufficientStorage { available, .. }) => assert_eq!(available, 100),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_load_rejects_bad_configuration() {
        let config = SystemConfiguration {
            processor_count: 0,
            ..SystemConfiguration::default()
        };
        assert!(matches!(
            System::load(&config, &image(vec![halt(0)])),
            Err(LoadError::Configuration(ConfigurationError::NoProcessors))
        ));
    }

    #[test]
    fn test_run_all_processors() {
        let config = SystemConfiguration {
            processor_count: 3,
            ..SystemConfiguration::default()
        };
        let mut system = System::load(&config, &image(vec![halt(0o17)])).expect("loads");
        system.start_all();
        system.run();
        for status in system.status() {
            assert!(!status.running);
            assert_eq!(status.stop_reason, StopReason::Debug);
            assert_eq!(status.stop_detail, 0o17);
        }
    }
}
