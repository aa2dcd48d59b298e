// src/models/course.rs

use chrono::Utc;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::models::quiz::{CorrectAnswer, PublicQuestion, QuizQuestion};

/// Represents a document in the 'courses' collection.
/// Courses are immutable after seeding; authoring is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,

    #[serde(default)]
    pub lessons: Vec<Lesson>,

    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// A lesson within a course. `lesson_number` is 1-based and dense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_number: i64,
    pub title: String,
    pub content: String,

    #[serde(default)]
    pub quiz: Vec<QuizQuestion>,
}

/// DTO for a lesson without the answer key.
#[derive(Debug, Serialize)]
pub struct LessonResponse {
    pub lesson_number: i64,
    pub title: String,
    pub content: String,
    pub quiz: Vec<PublicQuestion>,
}

/// DTO for returning a course to clients.
#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub lessons: Vec<LessonResponse>,
}

impl From<&Course> for CourseResponse {
    fn from(course: &Course) -> Self {
        CourseResponse {
            id: course.id.clone(),
            title: course.title.clone(),
            description: course.description.clone(),
            category: course.category.clone(),
            difficulty: course.difficulty.clone(),
            lessons: course
                .lessons
                .iter()
                .map(|lesson| LessonResponse {
                    lesson_number: lesson.lesson_number,
                    title: lesson.title.clone(),
                    content: lesson.content.clone(),
                    quiz: lesson.quiz.iter().map(PublicQuestion::from).collect(),
                })
                .collect(),
        }
    }
}

fn course(
    title: &str,
    description: &str,
    category: &str,
    difficulty: &str,
    lessons: Vec<Lesson>,
) -> Course {
    let now = DateTime::from_chrono(Utc::now());
    Course {
        id: uuid::Uuid::new_v4().to_string(),
        title: title.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        difficulty: difficulty.to_string(),
        lessons,
        created_at: now,
        updated_at: now,
    }
}

fn lesson(number: i64, title: &str, content: &str, quiz: Vec<QuizQuestion>) -> Lesson {
    Lesson {
        lesson_number: number,
        title: title.to_string(),
        content: content.to_string(),
        quiz,
    }
}

fn question(
    text: &str,
    options: &[&str],
    correct_answer: CorrectAnswer,
    explanation: &str,
) -> QuizQuestion {
    QuizQuestion {
        text: text.to_string(),
        options: options.iter().map(|s| s.to_string()).collect(),
        correct_answer,
        explanation: Some(explanation.to_string()),
    }
}

/// Seed catalog inserted by the initialize/reinitialize endpoints.
///
/// Note: some questions store the correct answer as an option index and some
/// as the option text. Both conventions exist in production data and the
/// evaluator accepts either.
pub fn initial_courses() -> Vec<Course> {
    vec![
        course(
            "Introduction to Computer Architecture",
            "Learn the fundamentals of computer organization, CPU design, memory systems, and I/O interfaces.",
            "Computer Science",
            "Beginner",
            vec![
                lesson(
                    1,
                    "The Central Processing Unit",
                    "The CPU fetches, decodes and executes instructions. This lesson walks through the instruction cycle and the role of registers.",
                    vec![question(
                        "What is the main function of the CPU?",
                        &[
                            "To store data permanently",
                            "To execute instructions and process data",
                            "To display graphics",
                            "To connect to the internet",
                        ],
                        CorrectAnswer::Index(1),
                        "The CPU executes instructions and processes data; it is often called the 'brain' of the computer.",
                    )],
                ),
                lesson(
                    2,
                    "Memory Hierarchy",
                    "From registers to caches to main memory: why computers layer storage by speed and cost.",
                    vec![question(
                        "Which component is responsible for temporary data storage?",
                        &["Hard Drive", "RAM", "CPU", "Power Supply"],
                        CorrectAnswer::Text("RAM".to_string()),
                        "RAM holds data temporarily while the computer is running.",
                    )],
                ),
            ],
        ),
        course(
            "Introduction to Healthcare",
            "Explore the basics of healthcare systems, medical terminology, and patient care fundamentals.",
            "Healthcare",
            "Beginner",
            vec![
                lesson(
                    1,
                    "Roles in Patient Care",
                    "An overview of the care team and how responsibilities are shared across it.",
                    vec![question(
                        "What is the primary role of a nurse?",
                        &[
                            "Only to administer medications",
                            "To provide patient care and support",
                            "Only to take vital signs",
                            "Only to assist doctors",
                        ],
                        CorrectAnswer::Index(1),
                        "Nurses assess, plan, implement and evaluate patient care.",
                    )],
                ),
                lesson(
                    2,
                    "Patient Privacy",
                    "Why health information is protected and what rules govern its handling.",
                    vec![question(
                        "What does HIPAA stand for?",
                        &[
                            "Health Insurance Portability and Accountability Act",
                            "Health Information Protection and Access Act",
                            "Healthcare Insurance and Patient Access Act",
                            "Health Information Privacy and Accountability Act",
                        ],
                        CorrectAnswer::Index(0),
                        "HIPAA protects patient privacy and health information.",
                    )],
                ),
            ],
        ),
        course(
            "Introduction to Electrical Engineering",
            "Study basic electrical circuits, components, and fundamental principles of electrical engineering.",
            "Engineering",
            "Beginner",
            vec![
                lesson(
                    1,
                    "Circuit Fundamentals",
                    "Voltage, current and resistance, and the law that ties them together.",
                    vec![question(
                        "What is Ohm's Law?",
                        &["V = IR", "P = VI", "I = V/R", "R = V/I"],
                        CorrectAnswer::Text("V = IR".to_string()),
                        "Ohm's Law states that voltage equals current times resistance.",
                    )],
                ),
                lesson(
                    2,
                    "Units and Measurement",
                    "The electrical units you will use in every circuit calculation.",
                    vec![question(
                        "What is the unit of electrical resistance?",
                        &["Volt", "Ampere", "Ohm", "Watt"],
                        CorrectAnswer::Index(2),
                        "Electrical resistance is measured in Ohms.",
                    )],
                ),
            ],
        ),
        course(
            "Introduction to Chemistry",
            "Learn about atomic structure, chemical bonding, reactions, and basic laboratory techniques.",
            "Science",
            "Beginner",
            vec![
                lesson(
                    1,
                    "Atoms and Elements",
                    "Protons, neutrons and electrons, and how the periodic table is organized.",
                    vec![question(
                        "What is the atomic number of Hydrogen?",
                        &["1", "2", "3", "4"],
                        CorrectAnswer::Index(0),
                        "Hydrogen has one proton, so its atomic number is 1.",
                    )],
                ),
                lesson(
                    2,
                    "Molecules and Compounds",
                    "How atoms combine into the substances around us.",
                    vec![question(
                        "What is the chemical formula for water?",
                        &["CO2", "H2O", "O2", "H2O2"],
                        CorrectAnswer::Text("H2O".to_string()),
                        "Water consists of two hydrogen atoms and one oxygen atom.",
                    )],
                ),
            ],
        ),
        course(
            "Advanced Computer Networks",
            "Deep dive into network protocols, routing, switching, and advanced networking concepts.",
            "Computer Science",
            "Advanced",
            vec![
                lesson(
                    1,
                    "Routing Between Networks",
                    "How packets find their way across interconnected networks.",
                    vec![question(
                        "What is the purpose of a router?",
                        &[
                            "To connect devices within a local network",
                            "To forward data packets between networks",
                            "To store data",
                            "To process data",
                        ],
                        CorrectAnswer::Index(1),
                        "A router forwards data packets between different networks.",
                    )],
                ),
                lesson(
                    2,
                    "The Internet Protocol Suite",
                    "The layered protocol stack that the Internet runs on.",
                    vec![question(
                        "What is TCP/IP?",
                        &[
                            "A type of computer",
                            "A network protocol suite",
                            "A type of cable",
                            "A type of server",
                        ],
                        CorrectAnswer::Text("A network protocol suite".to_string()),
                        "TCP/IP is the suite of communication protocols used to interconnect devices on the internet.",
                    )],
                ),
            ],
        ),
        course(
            "Biochemistry",
            "Study the chemical processes within living organisms, including metabolism and molecular biology.",
            "Science",
            "Advanced",
            vec![
                lesson(
                    1,
                    "Genetic Information",
                    "How living cells store and transmit the instructions for life.",
                    vec![question(
                        "What is the primary function of DNA?",
                        &[
                            "To provide energy",
                            "To store genetic information",
                            "To build cell walls",
                            "To transport oxygen",
                        ],
                        CorrectAnswer::Index(1),
                        "DNA stores and transmits genetic information.",
                    )],
                ),
                lesson(
                    2,
                    "Cellular Energy",
                    "The molecules that power every reaction inside a cell.",
                    vec![question(
                        "What is the main energy currency of cells?",
                        &["DNA", "RNA", "ATP", "Glucose"],
                        CorrectAnswer::Index(2),
                        "ATP (Adenosine Triphosphate) is the main energy currency of cells.",
                    )],
                ),
            ],
        ),
    ]
}
