//! Byte-exact save images for integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use campaign_core::writer::LittleEndianWriter;

type W = LittleEndianWriter<Cursor<Vec<u8>>>;

pub const SAMPLE_TICKS: i64 = 638_000_000_000_000_000;

#[derive(Debug, Clone)]
pub struct Squaddie {
    pub id: i32,
    pub first: String,
    pub template: String,
}

impl Squaddie {
    pub fn new(id: i32, first: &str, template: &str) -> Self {
        Self {
            id,
            first: first.to_string(),
            template: template.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Leader {
    pub id: i32,
    pub tag: &'static str,
    pub template: String,
    pub name: String,
    pub armor: f32,
}

impl Leader {
    pub fn new(id: i32, name: &str) -> Self {
        Self {
            id,
            tag: "Infantry",
            template: "LeaderRifle".to_string(),
            name: name.to_string(),
            armor: 1.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Planet {
    pub template: String,
    pub control: i32,
    pub control_change: i32,
}

impl Planet {
    pub fn new(template: &str, control: i32, control_change: i32) -> Self {
        Self {
            template: template.to_string(),
            control,
            control_change,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SaveFixture {
    pub version: i32,
    pub state: i32,
    pub ticks: i64,
    pub save_name: String,
    pub strategy_config: String,

    pub ironman: bool,
    pub ironman_name: String,
    pub seed: i32,
    pub resources: Vec<i32>,
    pub marker: i32,

    pub ship_slot_count: Option<i32>,
    pub squaddie_count: Option<i32>,
    pub squaddies: Vec<Squaddie>,
    /// Raw bytes placed between the squaddie entries and the roster.
    pub after_squaddies: Vec<u8>,
    pub hired: Vec<Leader>,
    pub dismissed: Vec<Leader>,
    pub dead_unburied: Vec<Leader>,
    pub dead_buried: Vec<Leader>,
    pub planets: Vec<Planet>,
    pub operation: bool,
}

impl SaveFixture {
    pub fn new(version: i32) -> Self {
        Self {
            version,
            state: 0,
            ticks: SAMPLE_TICKS,
            save_name: "Autosave".to_string(),
            strategy_config: "Standard".to_string(),
            ironman: true,
            ironman_name: "Iron Run".to_string(),
            seed: 1234,
            resources: vec![100, 50, 0],
            marker: 42,
            ship_slot_count: None,
            squaddie_count: None,
            squaddies: vec![Squaddie::new(1, "Ann", "Rifleman")],
            after_squaddies: Vec::new(),
            hired: vec![Leader::new(10, "Vera")],
            dismissed: Vec::new(),
            dead_unburied: Vec::new(),
            dead_buried: vec![Leader::new(11, "Otto")],
            planets: vec![Planet::new("Korolev", 60, 2), Planet::new("Tiamat", 20, -1)],
            operation: true,
        }
    }

    fn has_strategy_config(&self) -> bool {
        self.version > 27
    }

    fn marked(&self) -> bool {
        self.version >= 101
    }

    fn template(&self, w: &mut W, name: &str) {
        if self.marked() {
            w.write_u8(1).unwrap();
        }
        w.write_string(name).unwrap();
    }

    pub fn header_bytes(&self) -> Vec<u8> {
        let mut w = LittleEndianWriter::new(Cursor::new(Vec::new()));
        w.write_i32(self.version).unwrap();
        w.write_i32(self.state).unwrap();
        w.write_i64(self.ticks).unwrap();
        w.write_string("Korolev").unwrap();
        w.write_string("Operation Dawn").unwrap();
        w.write_i32(3).unwrap();
        w.write_i32(5).unwrap();
        w.write_string("Normal").unwrap();
        if self.has_strategy_config() {
            w.write_string(&self.strategy_config).unwrap();
        }
        w.write_f64(5400.5).unwrap();
        w.write_string(&self.save_name).unwrap();
        w.into_inner().into_inner()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = LittleEndianWriter::new(Cursor::new(Vec::new()));
        w.write_bytes(&self.header_bytes()).unwrap();

        // essential
        w.write_f64(5400.5).unwrap();
        w.write_bool(self.ironman).unwrap();
        w.write_string(&self.ironman_name).unwrap();
        w.write_i32(self.seed).unwrap();
        w.write_bool(true).unwrap();
        w.write_bool(false).unwrap();
        if self.has_strategy_config() {
            w.write_bool(true).unwrap();
            w.write_string(&self.strategy_config).unwrap();
        } else {
            w.write_string("Normal").unwrap();
        }
        w.write_i32(self.resources.len() as i32).unwrap();
        for &r in &self.resources {
            w.write_i32(r).unwrap();
        }
        if self.version >= 7 {
            w.write_i32(self.marker).unwrap();
        }

        self.write_extended(&mut w);
        w.into_inner().into_inner()
    }

    fn write_extended(&self, w: &mut W) {
        // ship upgrades
        match self.ship_slot_count {
            Some(count) => w.write_i32(count).unwrap(),
            None => {
                w.write_i32(2).unwrap();
                w.write_string("Bow").unwrap();
                w.write_bool(true).unwrap();
                self.template(w, "ArmorPlate");
                w.write_string("Stern").unwrap();
                w.write_bool(false).unwrap();
            }
        }

        // owned items
        w.write_i32(1).unwrap();
        self.template(w, "Medkit");
        w.write_i32(4).unwrap();
        w.write_i32(1).unwrap();
        self.template(w, "BigMedkit");

        // black market
        w.write_i32(3).unwrap();
        w.write_i32(1).unwrap();
        self.template(w, "Grenade");
        w.write_i32(2).unwrap();
        w.write_i32(75).unwrap();

        // story factions
        w.write_i32(1).unwrap();
        self.template(w, "Rebels");
        w.write_i32(12).unwrap();
        w.write_bool(true).unwrap();

        // squaddies
        w.write_i32(99).unwrap();
        let count = self
            .squaddie_count
            .unwrap_or(self.squaddies.len() as i32);
        w.write_i32(count).unwrap();
        for s in &self.squaddies {
            w.write_i32(s.id).unwrap();
            w.write_u8(1).unwrap();
            w.write_u8(2).unwrap();
            w.write_i32(3).unwrap();
            w.write_i32(4).unwrap();
            w.write_string(&s.first).unwrap();
            w.write_string("Doe").unwrap();
            self.template(w, &s.template);
        }
        w.write_bytes(&self.after_squaddies).unwrap();

        // roster
        for list in [&self.hired, &self.dismissed, &self.dead_unburied, &self.dead_buried] {
            w.write_i32(list.len() as i32).unwrap();
            for leader in list {
                self.write_leader(w, leader);
            }
        }

        // battle plan
        w.write_i32(2).unwrap();
        w.write_i32(10).unwrap();
        w.write_i32(-1).unwrap();
        w.write_bool(false).unwrap();

        // planets
        for word in [7u32, 8, 9, 10] {
            w.write_u32(word).unwrap();
        }
        w.write_i32(self.planets.len() as i32).unwrap();
        for p in &self.planets {
            self.template(w, &p.template);
            w.write_i32(p.control).unwrap();
            w.write_i32(p.control_change).unwrap();
        }

        // operations
        w.write_i32(1).unwrap();
        self.template(w, "OpFinished");
        w.write_i32(777).unwrap();
        w.write_bool(self.operation).unwrap();
        if self.operation {
            self.template(w, "OpStorm");
            self.template(w, "Rebels");
            self.template(w, "Empire");
            w.write_i32(1).unwrap();
            self.template(w, "MissionOne");
            w.write_bool(true).unwrap();
            self.template(w, "Korolev");
            self.template(w, "ThreeDays");
            w.write_i32(1).unwrap();
            w.write_i32(2).unwrap();
        }
    }

    fn write_leader(&self, w: &mut W, leader: &Leader) {
        if self.version >= 101 {
            w.write_string(leader.tag).unwrap();
        } else {
            let raw = if leader.tag == "Vehicle" { 1 } else { 0 };
            w.write_i32(raw).unwrap();
        }
        self.template(w, &leader.template);
        w.write_i32(leader.id).unwrap();
        w.write_string(&leader.name).unwrap();

        // attributes
        w.write_i32(1).unwrap();
        w.write_string("Armor").unwrap();
        if self.version >= 26 {
            w.write_f32(leader.armor).unwrap();
        } else {
            w.write_i32((leader.armor * 100.0).round() as i32).unwrap();
        }
        // perks
        w.write_i32(1).unwrap();
        self.template(w, "PerkSteady");
        // item container
        w.write_i32(0).unwrap();
        // unit statistics
        w.write_i32(1).unwrap();
        w.write_string("Kills").unwrap();
        w.write_i32(9).unwrap();
        // emotional states
        w.write_i32(1).unwrap();
        self.template(w, "Shaken");
        w.write_i32(2).unwrap();
        // strategic duration
        w.write_i32(1).unwrap();
        w.write_i32(3).unwrap();
        // conversation
        w.write_bool(true).unwrap();
        w.write_string("Intro").unwrap();
        // health
        w.write_i32(0).unwrap();
        w.write_i32(0).unwrap();
        // skill indices
        w.write_i32(2).unwrap();
        w.write_i32(4).unwrap();
        w.write_i32(5).unwrap();
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, self.to_bytes()).expect("failed to write fixture");
        path
    }
}

/// Company placeholder payload: opaque bytes that never look like a roster.
pub fn company_blob() -> Vec<u8> {
    let mut blob = vec![0xFF; 6];
    blob.extend_from_slice(&[0x20, 0x00, 0x00, 0x00]);
    blob.extend_from_slice(b"company-state");
    blob
}
