use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::password::{hash_password, validate_password_strength, PasswordPolicy};
use crate::auth::UserRole;
use crate::models::{normalize_email, Exercise, ExerciseCategory, MuscleGroup, User};
use crate::store::Store;

struct SeedExercise {
    title: &'static str,
    description: &'static str,
    instructions: &'static [&'static str],
    muscle_group: MuscleGroup,
    category: ExerciseCategory,
    video_id: &'static str,
    duration_seconds: i32,
    is_sitting: bool,
    uses_theraband: bool,
    is_dynamic: bool,
    is_unilateral: bool,
}

const CATALOGUE: &[SeedExercise] = &[
    SeedExercise {
        title: "Armkreisen im Sitzen",
        description: "Lockert Schultern und Oberarme und fördert die Durchblutung.",
        instructions: &[
            "Setzen Sie sich aufrecht auf die vordere Stuhlkante.",
            "Strecken Sie beide Arme seitlich aus.",
            "Machen Sie kleine Kreise nach vorne, dann nach hinten.",
        ],
        muscle_group: MuscleGroup::Arms,
        category: ExerciseCategory::Mobility,
        video_id: "seniorfit-armkreisen",
        duration_seconds: 120,
        is_sitting: true,
        uses_theraband: false,
        is_dynamic: true,
        is_unilateral: false,
    },
    SeedExercise {
        title: "Bizepsbeugen mit Theraband",
        description: "Kräftigt die Oberarme für das Tragen von Einkäufen.",
        instructions: &[
            "Stellen Sie beide Füße auf das Theraband.",
            "Halten Sie die Enden mit gestreckten Armen fest.",
            "Beugen Sie langsam die Ellenbogen und senken Sie die Arme kontrolliert.",
        ],
        muscle_group: MuscleGroup::Arms,
        category: ExerciseCategory::Strength,
        video_id: "seniorfit-bizeps-theraband",
        duration_seconds: 150,
        is_sitting: true,
        uses_theraband: true,
        is_dynamic: true,
        is_unilateral: false,
    },
    SeedExercise {
        title: "Wand-Liegestütz",
        description: "Sanftes Krafttraining für Arme und Brust im Stehen.",
        instructions: &[
            "Stellen Sie sich eine Armlänge vor eine Wand.",
            "Legen Sie die Hände schulterbreit an die Wand.",
            "Beugen Sie die Arme, bis die Nase fast die Wand berührt, und drücken Sie sich zurück.",
        ],
        muscle_group: MuscleGroup::Arms,
        category: ExerciseCategory::Strength,
        video_id: "seniorfit-wand-liegestuetz",
        duration_seconds: 120,
        is_sitting: false,
        uses_theraband: false,
        is_dynamic: true,
        is_unilateral: false,
    },
    SeedExercise {
        title: "Aufstehen vom Stuhl",
        description: "Stärkt die Beinmuskulatur für mehr Sicherheit im Alltag.",
        instructions: &[
            "Setzen Sie sich auf einen stabilen Stuhl ohne Rollen.",
            "Verschränken Sie die Arme vor der Brust.",
            "Stehen Sie langsam auf und setzen Sie sich kontrolliert wieder hin.",
        ],
        muscle_group: MuscleGroup::Legs,
        category: ExerciseCategory::Strength,
        video_id: "seniorfit-aufstehen-stuhl",
        duration_seconds: 180,
        is_sitting: false,
        uses_theraband: false,
        is_dynamic: true,
        is_unilateral: false,
    },
    SeedExercise {
        title: "Einbeinstand mit Stuhl",
        description: "Schult das Gleichgewicht und beugt Stürzen vor.",
        instructions: &[
            "Stellen Sie sich hinter einen Stuhl und halten Sie die Lehne.",
            "Heben Sie ein Bein leicht an und halten Sie die Position.",
            "Wechseln Sie nach 20 Sekunden das Bein.",
        ],
        muscle_group: MuscleGroup::Legs,
        category: ExerciseCategory::Balance,
        video_id: "seniorfit-einbeinstand",
        duration_seconds: 120,
        is_sitting: false,
        uses_theraband: false,
        is_dynamic: false,
        is_unilateral: true,
    },
    SeedExercise {
        title: "Beinstrecken im Sitzen",
        description: "Kräftigt die Oberschenkel ohne die Knie zu belasten.",
        instructions: &[
            "Setzen Sie sich aufrecht hin.",
            "Strecken Sie ein Bein waagerecht nach vorne aus.",
            "Halten Sie kurz und senken Sie es langsam ab, dann die Seite wechseln.",
        ],
        muscle_group: MuscleGroup::Legs,
        category: ExerciseCategory::Strength,
        video_id: "seniorfit-beinstrecken",
        duration_seconds: 150,
        is_sitting: true,
        uses_theraband: false,
        is_dynamic: true,
        is_unilateral: true,
    },
    SeedExercise {
        title: "Rumpfdrehen im Sitzen",
        description: "Mobilisiert die Wirbelsäule und kräftigt die seitliche Bauchmuskulatur.",
        instructions: &[
            "Setzen Sie sich aufrecht hin, die Füße stehen hüftbreit.",
            "Legen Sie die Hände auf die Schultern.",
            "Drehen Sie den Oberkörper langsam nach rechts und links.",
        ],
        muscle_group: MuscleGroup::Core,
        category: ExerciseCategory::Mobility,
        video_id: "seniorfit-rumpfdrehen",
        duration_seconds: 120,
        is_sitting: true,
        uses_theraband: false,
        is_dynamic: true,
        is_unilateral: false,
    },
    SeedExercise {
        title: "Knieheben im Sitzen",
        description: "Aktiviert die Bauchmuskeln und die Hüftbeuger.",
        instructions: &[
            "Setzen Sie sich auf die vordere Stuhlkante und halten Sie sich seitlich fest.",
            "Heben Sie abwechselnd die Knie Richtung Brust.",
            "Atmen Sie dabei ruhig weiter.",
        ],
        muscle_group: MuscleGroup::Core,
        category: ExerciseCategory::Strength,
        video_id: "seniorfit-knieheben",
        duration_seconds: 120,
        is_sitting: true,
        uses_theraband: false,
        is_dynamic: true,
        is_unilateral: true,
    },
    SeedExercise {
        title: "Seitneigen im Stehen",
        description: "Dehnt die Flanken und verbessert die Beweglichkeit des Rumpfes.",
        instructions: &[
            "Stellen Sie sich hüftbreit hin, eine Hand an der Stuhllehne.",
            "Führen Sie den freien Arm über den Kopf.",
            "Neigen Sie sich sanft zur Seite und wechseln Sie danach.",
        ],
        muscle_group: MuscleGroup::Core,
        category: ExerciseCategory::Stretching,
        video_id: "seniorfit-seitneigen",
        duration_seconds: 90,
        is_sitting: false,
        uses_theraband: false,
        is_dynamic: false,
        is_unilateral: true,
    },
    SeedExercise {
        title: "Rudern mit Theraband",
        description: "Kräftigt den oberen Rücken für eine aufrechte Haltung.",
        instructions: &[
            "Legen Sie das Theraband um die Füße und halten Sie die Enden.",
            "Ziehen Sie die Ellenbogen nah am Körper nach hinten.",
            "Führen Sie die Arme langsam wieder nach vorne.",
        ],
        muscle_group: MuscleGroup::Back,
        category: ExerciseCategory::Strength,
        video_id: "seniorfit-rudern-theraband",
        duration_seconds: 150,
        is_sitting: true,
        uses_theraband: true,
        is_dynamic: true,
        is_unilateral: false,
    },
    SeedExercise {
        title: "Katzenbuckel im Sitzen",
        description: "Mobilisiert die gesamte Wirbelsäule.",
        instructions: &[
            "Setzen Sie sich aufrecht hin, die Hände auf den Knien.",
            "Machen Sie beim Ausatmen einen runden Rücken.",
            "Richten Sie sich beim Einatmen wieder auf und öffnen Sie die Brust.",
        ],
        muscle_group: MuscleGroup::Back,
        category: ExerciseCategory::Mobility,
        video_id: "seniorfit-katzenbuckel",
        duration_seconds: 120,
        is_sitting: true,
        uses_theraband: false,
        is_dynamic: true,
        is_unilateral: false,
    },
    SeedExercise {
        title: "Arm-Bein-Koordination im Stand",
        description: "Trainiert Rückenstrecker und Koordination zugleich.",
        instructions: &[
            "Stellen Sie sich hinter einen Stuhl und halten Sie sich mit einer Hand fest.",
            "Heben Sie den freien Arm und das gegenüberliegende Bein nach hinten.",
            "Halten Sie kurz und wechseln Sie die Seite.",
        ],
        muscle_group: MuscleGroup::Back,
        category: ExerciseCategory::Coordination,
        video_id: "seniorfit-arm-bein",
        duration_seconds: 150,
        is_sitting: false,
        uses_theraband: false,
        is_dynamic: true,
        is_unilateral: true,
    },
    SeedExercise {
        title: "Schulterkreisen",
        description: "Löst Verspannungen im Nacken- und Schulterbereich.",
        instructions: &[
            "Lassen Sie die Arme locker hängen.",
            "Ziehen Sie die Schultern hoch und kreisen Sie sie nach hinten.",
            "Nach einigen Wiederholungen die Richtung wechseln.",
        ],
        muscle_group: MuscleGroup::Shoulders,
        category: ExerciseCategory::Mobility,
        video_id: "seniorfit-schulterkreisen",
        duration_seconds: 90,
        is_sitting: true,
        uses_theraband: false,
        is_dynamic: true,
        is_unilateral: false,
    },
    SeedExercise {
        title: "Seitheben mit Theraband",
        description: "Kräftigt die Schultermuskulatur für Überkopfbewegungen.",
        instructions: &[
            "Stellen Sie sich mittig auf das Theraband.",
            "Heben Sie die Arme seitlich bis auf Schulterhöhe.",
            "Senken Sie die Arme langsam wieder ab.",
        ],
        muscle_group: MuscleGroup::Shoulders,
        category: ExerciseCategory::Strength,
        video_id: "seniorfit-seitheben",
        duration_seconds: 150,
        is_sitting: false,
        uses_theraband: true,
        is_dynamic: true,
        is_unilateral: false,
    },
    SeedExercise {
        title: "Schulterdehnung über Kreuz",
        description: "Dehnt die hintere Schulter und verbessert die Beweglichkeit.",
        instructions: &[
            "Führen Sie einen Arm gestreckt vor dem Körper zur anderen Seite.",
            "Ziehen Sie ihn mit der anderen Hand sanft heran.",
            "Halten Sie 20 Sekunden und wechseln Sie die Seite.",
        ],
        muscle_group: MuscleGroup::Shoulders,
        category: ExerciseCategory::Stretching,
        video_id: "seniorfit-schulterdehnung",
        duration_seconds: 90,
        is_sitting: true,
        uses_theraband: false,
        is_dynamic: false,
        is_unilateral: true,
    },
];

pub struct DatabaseSeeder {
    store: Arc<dyn Store>,
    bcrypt_cost: u32,
}

impl DatabaseSeeder {
    pub fn new(store: Arc<dyn Store>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    /// Safe to run on every start: existing data is left alone.
    pub async fn seed_all(&self, admin: Option<(&str, &str)>) -> Result<()> {
        tracing::info!("Starting database seeding...");

        self.seed_exercises().await?;
        if let Some((email, password)) = admin {
            self.seed_admin(email, password).await?;
        }

        tracing::info!("Database seeding completed!");
        Ok(())
    }

    /// Inserts the default catalogue into an empty exercise table.
    pub async fn seed_exercises(&self) -> Result<usize> {
        if self.store.count_exercises().await? > 0 {
            tracing::debug!("Exercises already present, skipping catalogue");
            return Ok(0);
        }

        let now = Utc::now();
        for seed in CATALOGUE {
            let exercise = Exercise {
                id: Uuid::new_v4(),
                title: seed.title.to_string(),
                description: seed.description.to_string(),
                instructions: seed.instructions.iter().map(|step| step.to_string()).collect(),
                muscle_group: seed.muscle_group,
                category: seed.category,
                video_id: seed.video_id.to_string(),
                thumbnail_url: None,
                duration_seconds: seed.duration_seconds,
                is_sitting: seed.is_sitting,
                uses_theraband: seed.uses_theraband,
                is_dynamic: seed.is_dynamic,
                is_unilateral: seed.is_unilateral,
                created_at: now,
                updated_at: now,
            };
            self.store
                .insert_exercise(&exercise)
                .await
                .with_context(|| format!("Failed to seed exercise '{}'", seed.title))?;
        }

        tracing::info!(count = CATALOGUE.len(), "Seeded exercise catalogue");
        Ok(CATALOGUE.len())
    }

    /// Creates the bootstrap admin, or promotes an existing account with that email.
    pub async fn seed_admin(&self, email: &str, password: &str) -> Result<()> {
        let email = normalize_email(email);

        if let Some(mut user) = self.store.find_user_by_email(&email).await? {
            if user.role != UserRole::Admin {
                user.role = UserRole::Admin;
                user.updated_at = Utc::now();
                self.store.update_user(&user).await?;
                tracing::info!(user_id = %user.id, "Promoted existing user to admin");
            }
            return Ok(());
        }

        validate_password_strength(password, &PasswordPolicy::default())
            .map_err(|err| anyhow::anyhow!("ADMIN_PASSWORD rejected: {err}"))?;
        let hash = hash_password(password, self.bcrypt_cost)?;
        let admin = User::new(&email, "Administrator", hash, UserRole::Admin, Utc::now());
        self.store.insert_user(&admin).await?;

        tracing::info!(user_id = %admin.id, "Created admin account");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::BTreeSet;

    #[test]
    fn test_catalogue_covers_every_group() {
        let groups: BTreeSet<MuscleGroup> = CATALOGUE.iter().map(|seed| seed.muscle_group).collect();
        assert_eq!(groups.len(), MuscleGroup::all().len());
        assert!(CATALOGUE.iter().all(|seed| seed.duration_seconds > 0));
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let seeder = DatabaseSeeder::new(store.clone(), 4);

        seeder
            .seed_all(Some(("Admin@Example.com", "adminpass1")))
            .await
            .unwrap();
        seeder
            .seed_all(Some(("admin@example.com", "adminpass1")))
            .await
            .unwrap();

        assert_eq!(store.count_exercises().await.unwrap(), CATALOGUE.len() as i64);
        assert_eq!(store.count_users().await.unwrap(), 1);
        let admin = store
            .find_user_by_email("admin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(admin.is_admin());
    }

    #[tokio::test]
    async fn test_weak_admin_password_rejected() {
        let seeder = DatabaseSeeder::new(Arc::new(MemoryStore::new()), 4);
        assert!(seeder.seed_admin("admin@example.com", "short").await.is_err());
    }
}
