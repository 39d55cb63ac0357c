//! # State Synchronization Records
//!
//! The per-tick actor snapshot broadcast to every watching client, and the
//! variant records that extend it.
//!
//! ## Base + trailer
//!
//! All record kinds share one base encoding; the shared sequence is written
//! and read by exactly one function pair and is never special-cased for a
//! variant. A concrete kind may append trailer fields strictly after the
//! base - after its optional groups and after the sync number - so decoding
//! trailer bytes as the base type simply leaves them unread. The wire
//! carries no kind discriminator: the message context tells the decoder
//! which kind applies.
//!
//! ## Two independent flag sets
//!
//! The actor-update family carries its own presence flags ahead of the
//! embedded state record, which carries another. Each flags value gates
//! only its declared groups and the two conditional blocks are serialized
//! one after the other, never interleaved.

use meridian_core::Vec3;

use crate::conditional::{read_group, write_group, FieldFlags};
use crate::error::WireResult;
use crate::frame::{Frame, FrameBuilder, Opcode};
use crate::object::WireObject;
use crate::quant::CoordVec3;
use crate::stream::{ByteReader, ByteWriter};
use crate::wire_enum;

wire_enum! {
    /// Primary movement state of an actor.
    pub enum ActorState: u8 {
        /// Standing still.
        Idle = 0,
        /// Ground movement.
        Walk = 1,
        /// Airborne, ascending.
        Jump = 2,
        /// Airborne, descending.
        Fall = 3,
        /// In water.
        Swim = 4,
        /// On a ladder or rope.
        Climb = 5,
        /// Knocked down or dead.
        Down = 6,
        /// Playing a scripted emote.
        Emote = 7,
    }
}

wire_enum! {
    /// Qualifier on the primary state.
    pub enum ActorSubState: u8 {
        /// No qualifier.
        None = 0,
        /// Sprinting variant of ground movement.
        Sprint = 1,
        /// Sneaking variant of ground movement.
        Sneak = 2,
        /// Gliding variant of airborne states.
        Glide = 3,
    }
}

/// Optional group bits of the state-sync record, in wire order.
///
/// Bit *i* set means group *i* is present. The hit group is serialized
/// right after the flags byte; the other five follow the fixed base
/// fields, in this order. The top two bits are reserved and must
/// round-trip as zero.
pub mod sync_flags {
    /// Hit-impulse group.
    pub const HIT: u8 = 1 << 0;
    /// Anchor group (attach to a world object).
    pub const ANCHOR: u8 = 1 << 1;
    /// Interaction group.
    pub const INTERACT: u8 = 1 << 2;
    /// Named-emote group.
    pub const EMOTE: u8 = 1 << 3;
    /// Mount group.
    pub const MOUNT: u8 = 1 << 4;
    /// Skill-cast group.
    pub const SKILL_CAST: u8 = 1 << 5;
    /// Union of all declared groups.
    pub const KNOWN: u8 = HIT | ANCHOR | INTERACT | EMOTE | MOUNT | SKILL_CAST;
}

/// Knockback applied by a hit this tick.
#[derive(Clone, Debug, PartialEq)]
pub struct HitImpulse {
    /// Object id of the attacker.
    pub attacker_id: i32,
    /// Stagger strength, world units ×10.
    pub stagger: i16,
}

/// Attachment to a world object (rope, chair, lift).
#[derive(Clone, Debug, PartialEq)]
pub struct Anchor {
    /// Offset from the anchor point, full precision.
    pub offset: Vec3,
    /// Anchor bone or attachment tag.
    pub tag: String,
}

/// An interaction the actor is performing.
#[derive(Clone, Debug, PartialEq)]
pub struct Interact {
    /// Interactable object id.
    pub object_id: i32,
    /// Client animation sequence to play.
    pub sequence_name: String,
}

/// Mount the actor is riding.
#[derive(Clone, Debug, PartialEq)]
pub struct Mount {
    /// Mount item id.
    pub mount_id: i32,
    /// Mount skin tag.
    pub tag: String,
}

/// Skill cast in progress, with its origin and aim.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillCast {
    /// Skill id being cast.
    pub skill_id: i32,
    /// Server-issued cast id.
    pub cast_id: i32,
    /// Motion point within the skill's animation.
    pub motion_point: u8,
    /// Cast origin, full precision.
    pub origin: Vec3,
    /// Aim direction, full precision.
    pub direction: Vec3,
}

/// The shared base of every state-sync record.
///
/// Field order on the wire is fixed: state, sub-state, flags, the hit
/// group when present, position (×10), rotation (×10), animation (plus
/// two override floats when the animation id has its high bit set), speed
/// (×10), sync mode, facing (×10), tilt (×1000), the remaining optional
/// groups in [`sync_flags`] order, and finally the sync number. The hit
/// group is the one group ahead of position; the client has always read
/// it there.
///
/// The flags byte is derived from which groups are present, so it can
/// never disagree with its payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateSync {
    /// Primary movement state.
    pub state: ActorState,
    /// State qualifier.
    pub sub_state: ActorSubState,
    /// World position; carried quantized at ×10 per axis.
    pub position: Vec3,
    /// Yaw in degrees ×10.
    pub rotation: i16,
    /// Animation id. Ids above 127 carry two override floats.
    pub animation: u8,
    /// Playback overrides (rate, blend) for animation ids above 127.
    pub anim_overrides: Option<[f32; 2]>,
    /// Velocity; carried quantized at ×10 per axis.
    pub speed: Vec3,
    /// Sync mode byte; live traffic always carries 2.
    pub sync_mode: u8,
    /// Facing in degrees ×10.
    pub facing: i16,
    /// Tilt ×1000.
    pub tilt: i16,
    /// Hit-impulse group (bit 0).
    pub hit: Option<HitImpulse>,
    /// Anchor group (bit 1).
    pub anchor: Option<Anchor>,
    /// Interaction group (bit 2).
    pub interact: Option<Interact>,
    /// Named-emote group (bit 3).
    pub emote: Option<String>,
    /// Mount group (bit 4).
    pub mount: Option<Mount>,
    /// Skill-cast group (bit 5).
    pub skill_cast: Option<SkillCast>,
    /// Monotonically increasing per-actor sync sequence number.
    pub sync_number: i32,
}

impl StateSync {
    /// Base record size in bytes with no optional groups present and a
    /// plain animation id.
    pub const BASE_SIZE: usize = 27;

    /// Derives the flags byte from which groups are present.
    #[must_use]
    pub fn flags(&self) -> FieldFlags {
        FieldFlags::NONE
            .with(sync_flags::HIT, self.hit.is_some())
            .with(sync_flags::ANCHOR, self.anchor.is_some())
            .with(sync_flags::INTERACT, self.interact.is_some())
            .with(sync_flags::EMOTE, self.emote.is_some())
            .with(sync_flags::MOUNT, self.mount.is_some())
            .with(sync_flags::SKILL_CAST, self.skill_cast.is_some())
    }
}

impl WireObject for StateSync {
    fn write_to(&self, writer: &mut ByteWriter) {
        assert_eq!(
            self.animation > 127,
            self.anim_overrides.is_some(),
            "animation override floats present iff the animation id has its high bit set"
        );

        writer.write_value(&self.state);
        writer.write_value(&self.sub_state);
        let flags = self.flags();
        flags.write(writer);

        // The hit group alone precedes position; the other five groups
        // follow tilt. Historical client layout, kept byte-exact.
        write_group(writer, flags, sync_flags::HIT, |w| {
            let hit = self.hit.as_ref().expect("gated by flags");
            w.write_i32(hit.attacker_id);
            w.write_i16(hit.stagger);
        });

        writer.write_value(&CoordVec3::from_world(self.position));
        writer.write_i16(self.rotation);
        writer.write_u8(self.animation);
        if let Some([rate, blend]) = self.anim_overrides {
            writer.write_f32(rate);
            writer.write_f32(blend);
        }
        writer.write_value(&CoordVec3::from_world(self.speed));
        writer.write_u8(self.sync_mode);
        writer.write_i16(self.facing);
        writer.write_i16(self.tilt);

        write_group(writer, flags, sync_flags::ANCHOR, |w| {
            let anchor = self.anchor.as_ref().expect("gated by flags");
            w.write_value(&anchor.offset);
            w.write_wide_str(&anchor.tag);
        });
        write_group(writer, flags, sync_flags::INTERACT, |w| {
            let interact = self.interact.as_ref().expect("gated by flags");
            w.write_i32(interact.object_id);
            w.write_wide_str(&interact.sequence_name);
        });
        write_group(writer, flags, sync_flags::EMOTE, |w| {
            w.write_wide_str(self.emote.as_deref().expect("gated by flags"));
        });
        write_group(writer, flags, sync_flags::MOUNT, |w| {
            let mount = self.mount.as_ref().expect("gated by flags");
            w.write_i32(mount.mount_id);
            w.write_wide_str(&mount.tag);
        });
        write_group(writer, flags, sync_flags::SKILL_CAST, |w| {
            let cast = self.skill_cast.as_ref().expect("gated by flags");
            w.write_i32(cast.skill_id);
            w.write_i32(cast.cast_id);
            w.write_u8(cast.motion_point);
            w.write_value(&cast.origin);
            w.write_value(&cast.direction);
        });

        writer.write_i32(self.sync_number);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        let state = reader.read_value::<ActorState>()?;
        let sub_state = reader.read_value::<ActorSubState>()?;
        let flags = FieldFlags::read(reader, sync_flags::KNOWN)?;

        let hit = read_group(reader, flags, sync_flags::HIT, |r| {
            Ok(HitImpulse {
                attacker_id: r.read_i32()?,
                stagger: r.read_i16()?,
            })
        })?;

        let position = reader.read_value::<CoordVec3>()?.to_world();
        let rotation = reader.read_i16()?;
        let animation = reader.read_u8()?;
        let anim_overrides = if animation > 127 {
            Some([reader.read_f32()?, reader.read_f32()?])
        } else {
            None
        };
        let speed = reader.read_value::<CoordVec3>()?.to_world();
        let sync_mode = reader.read_u8()?;
        let facing = reader.read_i16()?;
        let tilt = reader.read_i16()?;

        let anchor = read_group(reader, flags, sync_flags::ANCHOR, |r| {
            Ok(Anchor {
                offset: r.read_value()?,
                tag: r.read_wide_str()?,
            })
        })?;
        let interact = read_group(reader, flags, sync_flags::INTERACT, |r| {
            Ok(Interact {
                object_id: r.read_i32()?,
                sequence_name: r.read_wide_str()?,
            })
        })?;
        let emote = read_group(reader, flags, sync_flags::EMOTE, |r| r.read_wide_str())?;
        let mount = read_group(reader, flags, sync_flags::MOUNT, |r| {
            Ok(Mount {
                mount_id: r.read_i32()?,
                tag: r.read_wide_str()?,
            })
        })?;
        let skill_cast = read_group(reader, flags, sync_flags::SKILL_CAST, |r| {
            Ok(SkillCast {
                skill_id: r.read_i32()?,
                cast_id: r.read_i32()?,
                motion_point: r.read_u8()?,
                origin: r.read_value()?,
                direction: r.read_value()?,
            })
        })?;

        let sync_number = reader.read_i32()?;

        Ok(Self {
            state,
            sub_state,
            position,
            rotation,
            animation,
            anim_overrides,
            speed,
            sync_mode,
            facing,
            tilt,
            hit,
            anchor,
            interact,
            emote,
            mount,
            skill_cast,
            sync_number,
        })
    }
}

wire_enum! {
    /// Outcome byte of a minigame round.
    pub enum MinigameOutcome: u8 {
        /// Still playing.
        InProgress = 0,
        /// Survived or answered correctly.
        Won = 1,
        /// Eliminated this round.
        Lost = 2,
    }
}

/// Trailer appended by the minigame record kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MinigameResult {
    /// Round number within the minigame.
    pub round: i32,
    /// Accumulated score.
    pub score: i32,
    /// Round outcome.
    pub outcome: MinigameOutcome,
}

impl WireObject for MinigameResult {
    fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_i32(self.round);
        writer.write_i32(self.score);
        writer.write_value(&self.outcome);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            round: reader.read_i32()?,
            score: reader.read_i32()?,
            outcome: reader.read_value()?,
        })
    }
}

/// The closed set of concrete state-sync record kinds.
///
/// Chosen by the message context, never carried on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncKind {
    /// Plain movement record: base encoding only.
    #[default]
    Movement,
    /// Minigame participant: base plus a [`MinigameResult`] trailer.
    Minigame,
}

/// A state-sync record of a concrete kind.
///
/// Each variant owns a full base record; a kind with a trailer appends it
/// strictly after the base encoding. The base sequence is shared through
/// [`StateSync`]'s own [`WireObject`] impl and is never overridden.
#[derive(Clone, Debug, PartialEq)]
pub enum ActorSyncRecord {
    /// Plain movement.
    Movement(StateSync),
    /// Minigame participant with its result trailer.
    Minigame {
        /// The shared base record.
        base: StateSync,
        /// Kind-specific trailer.
        result: MinigameResult,
    },
}

impl ActorSyncRecord {
    /// The record's kind, for the caller-side dispatch that decodes it.
    #[must_use]
    pub const fn kind(&self) -> SyncKind {
        match self {
            Self::Movement(_) => SyncKind::Movement,
            Self::Minigame { .. } => SyncKind::Minigame,
        }
    }

    /// The shared base record.
    #[must_use]
    pub const fn base(&self) -> &StateSync {
        match self {
            Self::Movement(base) | Self::Minigame { base, .. } => base,
        }
    }

    /// Appends the record: base first, then the kind's trailer if any.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        match self {
            Self::Movement(base) => base.write_to(writer),
            Self::Minigame { base, result } => {
                base.write_to(writer);
                result.write_to(writer);
            }
        }
    }

    /// Decodes a record as the kind the message context dictates.
    pub fn read_as(kind: SyncKind, reader: &mut ByteReader<'_>) -> WireResult<Self> {
        let base = StateSync::read_from(reader)?;
        Ok(match kind {
            SyncKind::Movement => Self::Movement(base),
            SyncKind::Minigame => Self::Minigame {
                base,
                result: MinigameResult::read_from(reader)?,
            },
        })
    }
}

wire_enum! {
    /// Commands of the [`Opcode::ActorUpdate`] family.
    pub enum ActorUpdateCommand: u8 {
        /// Full attribute snapshot for one actor.
        Snapshot = 0,
        /// Actor left scope; no further payload but the id.
        Remove = 1,
    }
}

/// Attribute-presence bits of the actor-update snapshot, in wire order.
pub mod update_flags {
    /// Display-name group.
    pub const NAME: u8 = 1 << 0;
    /// Title group.
    pub const TITLE: u8 = 1 << 1;
    /// Level group.
    pub const LEVEL: u8 = 1 << 2;
    /// Union of all declared groups.
    pub const KNOWN: u8 = NAME | TITLE | LEVEL;
}

/// One actor's attribute snapshot, with its embedded motion record.
///
/// Carries two independent flag sets: the update-presence flags gate the
/// name/title/level groups and are fully serialized before the embedded
/// [`StateSync`], whose own flags gate only its motion groups.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActorUpdate {
    /// Object id of the actor.
    pub actor_id: i32,
    /// Display name, when changed.
    pub name: Option<String>,
    /// Title, when changed.
    pub title: Option<String>,
    /// Level, when changed.
    pub level: Option<i16>,
    /// Current motion record.
    pub motion: StateSync,
}

impl ActorUpdate {
    fn update_flags(&self) -> FieldFlags {
        FieldFlags::NONE
            .with(update_flags::NAME, self.name.is_some())
            .with(update_flags::TITLE, self.title.is_some())
            .with(update_flags::LEVEL, self.level.is_some())
    }
}

impl WireObject for ActorUpdate {
    fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_i32(self.actor_id);

        // First conditional block: attribute presence.
        let flags = self.update_flags();
        flags.write(writer);
        write_group(writer, flags, update_flags::NAME, |w| {
            w.write_wide_str(self.name.as_deref().expect("gated by flags"));
        });
        write_group(writer, flags, update_flags::TITLE, |w| {
            w.write_wide_str(self.title.as_deref().expect("gated by flags"));
        });
        write_group(writer, flags, update_flags::LEVEL, |w| {
            w.write_i16(self.level.expect("gated by flags"));
        });

        // Second, independent block: the motion record's own flags.
        self.motion.write_to(writer);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        let actor_id = reader.read_i32()?;

        let flags = FieldFlags::read(reader, update_flags::KNOWN)?;
        let name = read_group(reader, flags, update_flags::NAME, |r| r.read_wide_str())?;
        let title = read_group(reader, flags, update_flags::TITLE, |r| r.read_wide_str())?;
        let level = read_group(reader, flags, update_flags::LEVEL, |r| r.read_i16())?;

        let motion = StateSync::read_from(reader)?;

        Ok(Self {
            actor_id,
            name,
            title,
            level,
            motion,
        })
    }
}

/// A complete actor-update message, command dispatch included.
#[derive(Clone, Debug, PartialEq)]
pub enum ActorUpdateMsg {
    /// Full snapshot.
    Snapshot(ActorUpdate),
    /// Actor left scope.
    Remove {
        /// Object id of the departing actor.
        actor_id: i32,
    },
}

impl ActorUpdateMsg {
    /// Builds the complete frame for this message.
    #[must_use]
    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = FrameBuilder::open(Opcode::ActorUpdate);
        match self {
            Self::Snapshot(update) => {
                frame.payload().write_value(&ActorUpdateCommand::Snapshot);
                frame.payload().write_object(update);
            }
            Self::Remove { actor_id } => {
                frame.payload().write_value(&ActorUpdateCommand::Remove);
                frame.payload().write_i32(*actor_id);
            }
        }
        frame.finish()
    }

    /// Decodes an actor-update payload, command byte first.
    pub fn from_frame(frame: &Frame<'_>) -> WireResult<Self> {
        let mut reader = frame.reader();
        match frame.read_command::<ActorUpdateCommand>(&mut reader)? {
            ActorUpdateCommand::Snapshot => Ok(Self::Snapshot(reader.read_object()?)),
            ActorUpdateCommand::Remove => Ok(Self::Remove {
                actor_id: reader.read_i32()?,
            }),
        }
    }
}
